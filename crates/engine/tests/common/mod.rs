#![allow(dead_code)]

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{Engine, MoneyCents, NewWalletCmd, Wallet};
use migration::MigratorTrait;

pub const USERS: [&str; 3] = ["alice", "bob", "carol"];

async fn seed_users(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    for username in USERS {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password_hash) VALUES (?, ?)",
            vec![username.into(), "not-a-real-hash".into()],
        ))
        .await
        .unwrap();
    }
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_users(&db).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    seed_users(&db).await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db, path)
}

pub fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

pub async fn wallet_with(engine: &Engine, owner: &str, name: &str, balance: i64) -> Wallet {
    engine
        .new_wallet(NewWalletCmd::new(owner, name).initial_balance(cents(balance)))
        .await
        .unwrap()
}

pub async fn balance_of(engine: &Engine, wallet_id: Uuid, user: &str) -> MoneyCents {
    engine.wallet(wallet_id, user).await.unwrap().balance
}
