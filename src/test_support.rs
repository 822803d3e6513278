//! In-process mock of the CondoLink REST backend for unit tests.
//!
//! Binds an axum router to `127.0.0.1:0` and counts calls per endpoint so
//! tests can assert how many refreshes, retries and fetches happened.

use crate::domain::models::{RoleCode, Session};
use crate::domain::snapshot::fixtures;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ADMIN_EMAIL: &str = "admin@condo.pt";
pub const ADMIN_PASSWORD: &str = "secret";
pub const RESIDENT_EMAIL: &str = "resident@condo.pt";

pub fn admin_session() -> Session {
    Session {
        id: 1,
        email: ADMIN_EMAIL.to_string(),
        full_name: "Admin".to_string(),
        role_code: RoleCode::Admin,
        building_id: Some(1),
        block_id: None,
        company_name: None,
        phone: None,
        access_token: "token-1".to_string(),
    }
}

fn resident_session() -> Session {
    Session {
        id: 2,
        email: RESIDENT_EMAIL.to_string(),
        full_name: "Resident 2".to_string(),
        role_code: RoleCode::Resident,
        building_id: Some(1),
        block_id: Some(1),
        company_name: None,
        phone: None,
        access_token: "token-1".to_string(),
    }
}

pub struct MockState {
    pub auth_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub probe_calls: AtomicUsize,
    pub dashboard_calls: AtomicUsize,
    pub refresh_ok: AtomicBool,
    pub reject_probes: AtomicBool,
    pub dashboard_fail: AtomicBool,
    pub dashboard_delay_ms: AtomicU64,
    pub reject_writes: AtomicBool,
    valid_token: Mutex<String>,
    token_seq: AtomicUsize,
    next_id: AtomicI64,
    requests: Mutex<Vec<(String, Value)>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            auth_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            probe_calls: AtomicUsize::new(0),
            dashboard_calls: AtomicUsize::new(0),
            refresh_ok: AtomicBool::new(true),
            reject_probes: AtomicBool::new(false),
            dashboard_fail: AtomicBool::new(false),
            dashboard_delay_ms: AtomicU64::new(0),
            reject_writes: AtomicBool::new(false),
            valid_token: Mutex::new("token-1".to_string()),
            token_seq: AtomicUsize::new(1),
            next_id: AtomicI64::new(100),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Invalidates whatever access token clients currently hold.
    pub fn expire_token(&self) {
        *self.valid_token.lock().unwrap() = "expired".to_string();
    }

    /// Body of the most recent request to `path`.
    pub fn last_body(&self, path: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    fn record(&self, path: impl Into<String>, body: Value) {
        self.requests.lock().unwrap().push((path.into(), body));
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v == expected)
            .unwrap_or(false)
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::new());
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }
}

type Shared = Arc<MockState>;

fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth", post(login))
        .route("/auth/refresh", get(refresh))
        .route("/probe", get(probe))
        .route("/dashboard", post(dashboard))
        .route("/buildings", get(buildings))
        .route("/register/user", post(register))
        .route("/admin/addSub", post(add_sub))
        .route("/admin/updateSub/:id", put(update_sub))
        .route("/admin/addMaintenance", post(add_maintenance))
        .route("/admin/updateMaintenance/:id", put(update_maintenance))
        .route("/admin/deleteMaintenance/:id", delete(delete_entity))
        .route("/admin/updateUser/:id", put(update_user))
        .route("/admin/deleteUser/:id", delete(delete_entity))
        .route("/admin/approveUser", post(approve_user))
        .with_state(state)
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.auth_calls.fetch_add(1, Ordering::SeqCst);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let session = match (email, password) {
        (ADMIN_EMAIL, ADMIN_PASSWORD) => admin_session(),
        (RESIDENT_EMAIL, ADMIN_PASSWORD) => resident_session(),
        _ => return unauthorized("Invalid credentials"),
    };
    *state.valid_token.lock().unwrap() = session.access_token.clone();
    Json(serde_json::to_value(session).unwrap()).into_response()
}

async fn refresh(State(state): State<Shared>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if !state.refresh_ok.load(Ordering::SeqCst) {
        return unauthorized("Refresh token expired");
    }
    let n = state.token_seq.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("token-{n}");
    *state.valid_token.lock().unwrap() = token.clone();
    Json(json!({ "accessToken": token })).into_response()
}

async fn probe(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.probe_calls.fetch_add(1, Ordering::SeqCst);
    if state.reject_probes.load(Ordering::SeqCst) || !state.authorized(&headers) {
        return unauthorized("jwt expired");
    }
    Json(json!({ "ok": true })).into_response()
}

async fn dashboard(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.dashboard_calls.fetch_add(1, Ordering::SeqCst);
    state.record("/dashboard", body);
    let delay = state.dashboard_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if !state.authorized(&headers) {
        return unauthorized("jwt expired");
    }
    if state.dashboard_fail.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "database unavailable" })),
        )
            .into_response();
    }
    Json(serde_json::to_value(fixtures::snapshot()).unwrap()).into_response()
}

async fn buildings() -> Json<Value> {
    let snapshot = fixtures::snapshot();
    Json(json!({ "buildings": snapshot.buildings, "blocks": snapshot.blocks }))
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.record("/register/user", body.clone());
    if body["email"] == "taken@condo.pt" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "Email already registered" })),
        )
            .into_response();
    }
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

/// Shared preamble for admin writes: bearer check, recording, and the
/// `reject_writes` switch. `Err` carries the response to return as-is.
fn admin_guard(state: &MockState, headers: &HeaderMap, path: String, body: Value) -> Result<(), Response> {
    if !state.authorized(headers) {
        return Err(unauthorized("jwt expired"));
    }
    state.record(path, body);
    if state.reject_writes.load(Ordering::SeqCst) {
        return Err(Json(json!({ "success": false, "message": "Not allowed" })).into_response());
    }
    Ok(())
}

fn with_id(mut body: Value, id: i64) -> Value {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), json!(id));
        obj.remove("password");
    }
    body
}

fn subcontractor_record(body: Value, id: i64) -> Value {
    let mut record = with_id(body, id);
    if let Some(obj) = record.as_object_mut() {
        obj.insert("roleCode".to_string(), json!(2));
        obj.remove("userId");
    }
    record
}

fn task_record(body: Value, id: i64) -> Value {
    let mut record = with_id(body, id);
    if let Some(obj) = record.as_object_mut() {
        obj.insert("created_at".to_string(), json!("2024-06-10T08:00:00Z"));
    }
    record
}

async fn add_sub(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = admin_guard(&state, &headers, "/admin/addSub".into(), body.clone()) {
        return resp;
    }
    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "success": true, "result": subcontractor_record(body, id) })).into_response()
}

async fn update_sub(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = admin_guard(&state, &headers, format!("/admin/updateSub/{id}"), body.clone()) {
        return resp;
    }
    Json(json!({ "success": true, "result": subcontractor_record(body, id) })).into_response()
}

async fn add_maintenance(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = admin_guard(&state, &headers, "/admin/addMaintenance".into(), body.clone()) {
        return resp;
    }
    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "success": true, "result": task_record(body, id) })).into_response()
}

async fn update_maintenance(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = admin_guard(&state, &headers, format!("/admin/updateMaintenance/{id}"), body.clone()) {
        return resp;
    }
    Json(json!({ "success": true, "result": task_record(body, id) })).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = admin_guard(&state, &headers, format!("/admin/updateUser/{id}"), body.clone()) {
        return resp;
    }
    let mut record = with_id(body, id);
    if let Some(obj) = record.as_object_mut() {
        obj.insert("roleCode".to_string(), json!(1));
    }
    Json(json!({ "success": true, "result": record })).into_response()
}

async fn delete_entity(State(state): State<Shared>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    if let Err(resp) = admin_guard(&state, &headers, format!("/admin/delete/{id}"), Value::Null) {
        return resp;
    }
    Json(json!({ "success": true })).into_response()
}

async fn approve_user(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = admin_guard(&state, &headers, "/admin/approveUser".into(), body) {
        return resp;
    }
    Json(json!({ "success": true })).into_response()
}
