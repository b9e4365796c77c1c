use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use tower_http::trace::TraceLayer;

use std::sync::Arc;

use crate::{budgets, expenses, goals, wallets};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolve the Basic credentials to a user and attach it to the request.
///
/// Unknown users and wrong passwords are indistinguishable to the client.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = users::Entity::find_by_id(auth_header.username())
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to load user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let password = auth_header.password().to_string();
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| {
            tracing::error!("password check panicked: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .unwrap_or(false);
    if !verified {
        tracing::debug!(username = %user.username, "rejected credentials");
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn trace_layer(router: Router) -> Router {
    let layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();
            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Store failures are logged where they are mapped to a response.
        .on_failure(());

    router.layer(layer)
}

pub(crate) fn router(state: ServerState) -> Router {
    let router = Router::new()
        .route("/wallets", get(wallets::list).post(wallets::create))
        .route(
            "/wallets/{id}",
            get(wallets::get)
                .patch(wallets::update)
                .delete(wallets::delete),
        )
        .route("/wallets/{id}/add_balance", post(wallets::add_balance))
        .route("/wallets/{id}/shares", post(wallets::share))
        .route(
            "/wallets/{id}/shares/{username}",
            axum::routing::delete(wallets::unshare),
        )
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/status", get(budgets::status))
        .route("/budgets/violations", get(budgets::violations))
        .route(
            "/budgets/{id}",
            get(budgets::get)
                .patch(budgets::update)
                .delete(budgets::delete),
        )
        .route("/goals", get(goals::list).post(goals::create))
        .route(
            "/goals/{id}",
            get(goals::get).patch(goals::update).delete(goals::delete),
        )
        .route("/goals/{id}/add_funds", post(goals::add_funds))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state);

    trace_layer(router)
}

/// Bind `addr` and serve until the process stops.
pub async fn run(engine: Engine, db: DatabaseConnection, addr: &str) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_with_listener(engine, db, listener).await
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, header},
    };
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, ActiveValue, Database};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const PASSWORD: &str = "correct horse";

    async fn app() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        for username in ["alice", "bob"] {
            users::ActiveModel {
                username: ActiveValue::Set(username.to_string()),
                password_hash: ActiveValue::Set(bcrypt::hash(PASSWORD, 4).unwrap()),
            }
            .insert(&db)
            .await
            .unwrap();
        }
        let engine = Engine::builder().database(db.clone()).build().await.unwrap();

        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic(username: &str, password: &str) -> String {
        let secret = format!("{username}:{password}");
        format!(
            "Basic {}",
            base64::prelude::BASE64_STANDARD.encode(secret)
        )
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        user: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic(user, PASSWORD));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_wallet(app: &Router, user: &str, name: &str, balance: i64) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/wallets",
            user,
            Some(json!({"name": name, "initialBalanceMinor": balance})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn requests_without_valid_credentials_are_rejected() {
        let app = app().await;

        let request = axum::http::Request::builder()
            .uri("/wallets")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = axum::http::Request::builder()
            .uri("/wallets")
            .header(header::AUTHORIZATION, basic("alice", "wrong"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = axum::http::Request::builder()
            .uri("/wallets")
            .header(header::AUTHORIZATION, basic("mallory", PASSWORD))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expense_debits_wallet_and_reports_it() {
        let app = app().await;
        let wallet_id = create_wallet(&app, "alice", "Main", 10_000).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/expenses",
            "alice",
            Some(json!({
                "amountMinor": 3_000,
                "category": "Food",
                "date": "2024-03-01T12:00:00Z",
                "walletId": wallet_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["expense"]["amountMinor"], 3_000);
        assert_eq!(body["wallet"]["balanceMinor"], 7_000);
        assert_eq!(body["budgetViolations"], json!([]));

        let (status, body) = send(
            &app,
            Method::GET,
            "/expenses?category=food",
            "alice",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn overdraft_is_unprocessable_and_leaves_balance() {
        let app = app().await;
        let wallet_id = create_wallet(&app, "alice", "Main", 1_000).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/expenses",
            "alice",
            Some(json!({
                "amountMinor": 1_001,
                "category": "rent",
                "date": "2024-03-01T00:00:00Z",
                "walletId": wallet_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("Insufficient funds"));

        let (_, wallet) = send(
            &app,
            Method::GET,
            &format!("/wallets/{wallet_id}"),
            "alice",
            None,
        )
        .await;
        assert_eq!(wallet["balanceMinor"], 1_000);
    }

    #[tokio::test]
    async fn foreign_wallet_is_not_found_until_shared() {
        let app = app().await;
        let wallet_id = create_wallet(&app, "alice", "Household", 5_000).await;
        let uri = format!("/wallets/{wallet_id}");

        let (status, _) = send(&app, Method::GET, &uri, "bob", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("{uri}/shares"),
            "alice",
            Some(json!({"username": "bob"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sharedWith"], json!(["bob"]));

        let (status, _) = send(&app, Method::GET, &uri, "bob", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::DELETE, &uri, "bob", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn funding_a_goal_moves_money_and_completes_it() {
        let app = app().await;
        let wallet_id = create_wallet(&app, "alice", "Savings", 10_000).await;

        let (status, goal) = send(
            &app,
            Method::POST,
            "/goals",
            "alice",
            Some(json!({"name": "Bike", "targetMinor": 4_000})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let fund_uri = format!("/goals/{}/add_funds", goal["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            Method::POST,
            &fund_uri,
            "alice",
            Some(json!({"amountMinor": 5_000, "walletId": wallet_id})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("Overfunding"));

        let (status, body) = send(
            &app,
            Method::POST,
            &fund_uri,
            "alice",
            Some(json!({"amountMinor": 4_000, "walletId": wallet_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["goal"]["currentMinor"], 4_000);
        assert_eq!(body["goal"]["isCompleted"], true);
        assert_eq!(body["wallet"]["balanceMinor"], 6_000);
    }

    #[tokio::test]
    async fn budget_reports_are_not_taken_for_ids() {
        let app = app().await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/budgets",
            "alice",
            Some(json!({
                "category": "food",
                "amountMinor": 1_000,
                "startDate": "2024-03-01T00:00:00Z",
                "endDate": "2024-04-01T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/expenses",
            "alice",
            Some(json!({
                "amountMinor": 1_500,
                "category": "Food",
                "date": "2024-03-10T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["wallet"], Value::Null);
        assert_eq!(body["budgetViolations"][0]["overageMinor"], 500);

        let (status, body) = send(&app, Method::GET, "/budgets/status", "alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["consumedMinor"], 1_500);
        assert_eq!(body[0]["exceeded"], true);

        let (status, body) = send(&app, Method::GET, "/budgets/violations", "alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }
}
