mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tokio::task::JoinSet;

use common::{balance_of, cents, engine_with_file_db, wallet_with};
use engine::{
    EngineError, ExpenseListFilter, FundGoalCmd, MoneyCents, NewExpenseCmd, NewGoalCmd,
    UpdateExpenseCmd,
};

fn march(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

fn assert_lost_race(err: &EngineError) {
    assert!(
        matches!(
            err,
            EngineError::InsufficientFunds(_)
                | EngineError::Overfunding { .. }
                | EngineError::Conflict(_)
        ),
        "unexpected error: {err}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_spending_never_overdraws() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let wallet = wallet_with(&engine, "alice", "Cash", 100_00).await;
    let goal = engine
        .new_goal(NewGoalCmd::new("alice", "Trip", cents(50_00)))
        .await
        .unwrap();

    // 10 x 10.00 in expenses plus 15.00 for the goal: more than the wallet holds.
    let mut tasks = JoinSet::new();
    for day in 1..=10 {
        let engine = Arc::clone(&engine);
        let wallet_id = wallet.id;
        tasks.spawn(async move {
            engine
                .record_expense(
                    NewExpenseCmd::new("alice", cents(10_00), "food", march(day))
                        .wallet_id(wallet_id),
                )
                .await
                .map(|outcome| outcome.expense.amount)
        });
    }
    {
        let engine = Arc::clone(&engine);
        let (goal_id, wallet_id) = (goal.id, wallet.id);
        tasks.spawn(async move {
            engine
                .fund_goal(FundGoalCmd::new(goal_id, wallet_id, cents(15_00), "alice"))
                .await
                .map(|_| cents(15_00))
        });
    }

    let mut spent = MoneyCents::ZERO;
    let mut failures = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(amount) => spent += amount,
            Err(err) => {
                assert_lost_race(&err);
                failures += 1;
            }
        }
    }
    assert!(failures >= 1);

    let balance = balance_of(&engine, wallet.id, "alice").await;
    assert!(!balance.is_negative());
    assert_eq!(balance, cents(100_00) - spent);

    let recorded: MoneyCents = engine
        .list_expenses(&ExpenseListFilter::default().wallet_id(wallet.id), "alice")
        .await
        .unwrap()
        .iter()
        .map(|expense| expense.amount)
        .sum();
    let goal = engine.goal(goal.id, "alice").await.unwrap();
    assert_eq!(recorded + goal.current, spent);

    drop(engine);
    db.close().await.unwrap();
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_edits_keep_wallet_in_step_with_expense() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let wallet = wallet_with(&engine, "alice", "Cash", 100_00).await;
    let expense = engine
        .record_expense(
            NewExpenseCmd::new("alice", cents(10_00), "food", march(1)).wallet_id(wallet.id),
        )
        .await
        .unwrap()
        .expense;

    let mut tasks = JoinSet::new();
    for amount in [20_00, 30_00, 40_00, 50_00] {
        let engine = Arc::clone(&engine);
        let expense_id = expense.id;
        tasks.spawn(async move {
            engine
                .update_expense(UpdateExpenseCmd::new(expense_id, "alice").amount(cents(amount)))
                .await
        });
    }

    let mut applied = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => applied += 1,
            Err(err) => assert_lost_race(&err),
        }
    }
    assert!(applied >= 1);

    // Whichever edit landed last, the wallet paid exactly the stored amount.
    let stored = engine.expense(expense.id, "alice").await.unwrap();
    assert_eq!(
        balance_of(&engine, wallet.id, "alice").await,
        cents(100_00) - stored.amount
    );

    drop(engine);
    db.close().await.unwrap();
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_funding_never_passes_the_target() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let wallet = wallet_with(&engine, "alice", "Savings", 100_00).await;
    let goal = engine
        .new_goal(NewGoalCmd::new("alice", "Bike", cents(50_00)))
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..3 {
        let engine = Arc::clone(&engine);
        let (goal_id, wallet_id) = (goal.id, wallet.id);
        tasks.spawn(async move {
            engine
                .fund_goal(FundGoalCmd::new(goal_id, wallet_id, cents(30_00), "alice"))
                .await
        });
    }

    let mut funded = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => funded += 1,
            Err(err) => assert_lost_race(&err),
        }
    }
    assert_eq!(funded, 1);

    let goal = engine.goal(goal.id, "alice").await.unwrap();
    assert_eq!(goal.current, cents(30_00));
    assert_eq!(
        balance_of(&engine, wallet.id, "alice").await,
        cents(70_00)
    );

    drop(engine);
    db.close().await.unwrap();
    let _ = std::fs::remove_file(path);
}
