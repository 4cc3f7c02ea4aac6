use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing};
use serde_json::{Value, json};

use crate::config::{Protocol, Scenario, WaitTime};
use crate::graphql::GraphQlReservationUser;
use crate::rest::RestReservationUser;
use crate::runner::run_scenario;
use crate::task::{Outcome, Task};
use crate::user::SimulatedUser;

fn rest_user(server: &TestServer) -> RestReservationUser {
    RestReservationUser::new(reqwest::Client::new(), &server.url("/"))
}

fn graphql_user(server: &TestServer) -> GraphQlReservationUser {
    GraphQlReservationUser::new(reqwest::Client::new(), &server.url("/graphql"))
}

async fn created_r1() -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({ "id": "r1" })))
}
async fn empty_list() -> Json<Value> {
    Json(json!([]))
}
async fn ok() -> StatusCode {
    StatusCode::OK
}
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
async fn conflict() -> StatusCode {
    StatusCode::CONFLICT
}
async fn server_error() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// The happy-path REST service: creates always yield `r1`, reads find
/// nothing, updates, deletes and cancels succeed.
fn happy_rest_router() -> Router {
    Router::new()
        .route(
            "/api/reservations",
            routing::post(created_r1).get(empty_list),
        )
        .route(
            "/api/reservations/{id}",
            routing::get(not_found).put(ok).delete(no_content),
        )
        .route("/api/reservations/{id}/cancel", routing::patch(ok))
}

#[tokio::test]
async fn rest_create_stores_id_and_absent_get_is_success() {
    let server = TestServer::with_router(happy_rest_router());
    let mut user = rest_user(&server);

    assert_eq!(user.perform(Task::Create).await, Outcome::Success);
    assert_eq!(user.reservation_id(), Some("r1"));

    // 404 under concurrent deletes is acceptable, and keeps the id
    assert_eq!(user.perform(Task::GetById).await, Outcome::Success);
    assert_eq!(user.reservation_id(), Some("r1"));
}

#[tokio::test]
async fn rest_create_conflict_counts_as_success() {
    let router = Router::new().route("/api/reservations", routing::post(conflict));
    let server = TestServer::with_router(router);
    let mut user = rest_user(&server);

    assert_eq!(user.perform(Task::Create).await, Outcome::Success);
    assert_eq!(user.reservation_id(), None);
}

#[tokio::test]
async fn rest_create_server_error_is_failure() {
    let router = Router::new().route("/api/reservations", routing::post(server_error));
    let server = TestServer::with_router(router);
    let mut user = rest_user(&server);

    match user.perform(Task::Create).await {
        Outcome::Failure(message) => assert!(message.contains("500"), "{message}"),
        outcome => panic!("expected failure, got {outcome:?}"),
    }
    assert_eq!(user.reservation_id(), None);
}

#[tokio::test]
async fn rest_numeric_create_id_is_accepted() {
    async fn create() -> (StatusCode, Json<Value>) {
        (StatusCode::CREATED, Json(json!({ "id": 42 })))
    }
    let router = Router::new().route("/api/reservations", routing::post(create));
    let server = TestServer::with_router(router);
    let mut user = rest_user(&server);

    assert_eq!(user.perform(Task::Create).await, Outcome::Success);
    assert_eq!(user.reservation_id(), Some("42"));
}

#[tokio::test]
async fn rest_create_sends_wire_payload() {
    type Captured = Arc<Mutex<Option<Value>>>;
    async fn create(
        State(state): State<Captured>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        *state.lock().unwrap() = Some(body);
        (StatusCode::CREATED, Json(json!({ "id": "r1" })))
    }

    let captured: Captured = Default::default();
    let router = Router::new()
        .route("/api/reservations", routing::post(create))
        .with_state(Arc::clone(&captured));
    let server = TestServer::with_router(router);
    let mut user = rest_user(&server);

    assert_eq!(user.perform(Task::Create).await, Outcome::Success);

    let body = captured.lock().unwrap().take().unwrap();
    let client_id = body["clientId"].as_u64().unwrap();
    assert!((1..=10).contains(&client_id));
    let guests = body["numberOfGuests"].as_u64().unwrap();
    assert!((1..=4).contains(&guests));
    let check_in = body["checkInDate"].as_str().unwrap();
    let check_out = body["checkOutDate"].as_str().unwrap();
    assert!(check_out > check_in);
    let status = body["status"].as_str().unwrap();
    assert!(status == "PENDING" || status == "CONFIRMED");
}

#[tokio::test]
async fn rest_delete_clears_id_and_following_tasks_skip() {
    let server = TestServer::with_router(happy_rest_router());
    let mut user = rest_user(&server);

    assert_eq!(user.perform(Task::Create).await, Outcome::Success);
    assert_eq!(user.perform(Task::Delete).await, Outcome::Success);
    assert_eq!(user.reservation_id(), None);

    assert_eq!(user.perform(Task::GetById).await, Outcome::Skipped);
    assert_eq!(user.perform(Task::Delete).await, Outcome::Skipped);
}

#[tokio::test]
async fn tasks_requiring_an_id_never_hit_the_wire_without_one() {
    // every route answers 500, so any issued call would be a failure
    let router = Router::new()
        .route(
            "/api/reservations/{id}",
            routing::get(server_error)
                .put(server_error)
                .delete(server_error),
        )
        .route(
            "/api/reservations/{id}/cancel",
            routing::patch(server_error),
        );
    let server = TestServer::with_router(router);
    let mut user = rest_user(&server);

    for task in [Task::GetById, Task::Update, Task::Cancel, Task::Delete] {
        assert_eq!(user.perform(task).await, Outcome::Skipped);
    }
}

#[tokio::test]
async fn rest_update_conflict_counts_as_success() {
    let router = Router::new()
        .route("/api/reservations", routing::post(created_r1))
        .route("/api/reservations/{id}", routing::put(conflict));
    let server = TestServer::with_router(router);
    let mut user = rest_user(&server);

    assert_eq!(user.perform(Task::Create).await, Outcome::Success);
    assert_eq!(user.perform(Task::Update).await, Outcome::Success);
}

/// A GraphQL endpoint dispatching on the operation named in the query text.
/// The create response is configurable per test.
fn graphql_router(create_response: Value) -> Router {
    async fn handler(State(create): State<Arc<Value>>, Json(body): Json<Value>) -> Json<Value> {
        let query = body["query"].as_str().unwrap_or_default();
        if query.contains("createReservation") {
            Json(Value::clone(&create))
        } else if query.contains("deleteReservation") {
            Json(json!({ "data": { "deleteReservation": true } }))
        } else {
            Json(json!({ "data": {} }))
        }
    }

    Router::new()
        .route("/graphql", routing::post(handler))
        .with_state(Arc::new(create_response))
}

#[tokio::test]
async fn graphql_create_stores_id() {
    let server = TestServer::with_router(graphql_router(
        json!({ "data": { "createReservation": { "id": "g1" } } }),
    ));
    let mut user = graphql_user(&server);

    assert_eq!(user.perform(Task::Create).await, Outcome::Success);
    assert_eq!(user.reservation_id(), Some("g1"));
}

#[tokio::test]
async fn graphql_errors_are_still_transport_success() {
    let server = TestServer::with_router(graphql_router(
        json!({ "errors": [{ "message": "room not available" }] }),
    ));
    let mut user = graphql_user(&server);

    // application error, transport success: recorded success, no usable id
    assert_eq!(user.perform(Task::Create).await, Outcome::Success);
    assert_eq!(user.reservation_id(), None);
    assert_eq!(user.perform(Task::GetById).await, Outcome::Skipped);
}

#[tokio::test]
async fn graphql_delete_clears_id() {
    let server = TestServer::with_router(graphql_router(
        json!({ "data": { "createReservation": { "id": "g1" } } }),
    ));
    let mut user = graphql_user(&server);

    assert_eq!(user.perform(Task::Create).await, Outcome::Success);
    assert_eq!(user.perform(Task::Delete).await, Outcome::Success);
    assert_eq!(user.reservation_id(), None);
    assert_eq!(user.perform(Task::Update).await, Outcome::Skipped);
}

#[tokio::test]
async fn graphql_rejects_unavailable_endpoint() {
    async fn unavailable() -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }
    let router = Router::new().route("/graphql", routing::post(unavailable));
    let server = TestServer::with_router(router);
    let mut user = graphql_user(&server);

    match user.perform(Task::GetAll).await {
        Outcome::Failure(message) => assert!(message.contains("503"), "{message}"),
        outcome => panic!("expected failure, got {outcome:?}"),
    }
}

#[tokio::test]
async fn scenario_runs_users_to_the_deadline() {
    let server = TestServer::with_router(happy_rest_router());
    let scenario = Scenario {
        name: "rest".to_owned(),
        protocol: Protocol::Rest,
        base_url: server.url("/"),
        users: 4,
        spawn_rate: None,
        wait_time: WaitTime {
            min: Duration::from_millis(5),
            max: Duration::from_millis(15),
        },
    };

    let (_scenario, metrics) =
        run_scenario(reqwest::Client::new(), scenario, Duration::from_millis(400)).await;

    let turns: u64 = metrics
        .ops
        .values()
        .map(|op| op.successes + op.failures + op.skips)
        .sum();
    assert!(turns > 0);
    for op in metrics.ops.values() {
        assert_eq!(op.failures, 0);
    }
}

struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
}

impl TestServer {
    fn with_router(router: Router) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.unwrap();
        });

        Self { handle, socket }
    }

    /// Returns a full URL pointing to the given path.
    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://localhost:{}/{}", self.socket.port(), path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
