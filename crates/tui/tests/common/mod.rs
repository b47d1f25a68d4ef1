//! In-process ledger backend for controller tests.
//!
//! Speaks the same REST contract as the real server under `/api`, keeps its
//! state in memory and records every request it receives.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use api_types::{AccountId, auth::Credentials, operation::OperationNew};
use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cofre_tui::{
    client::Client,
    controller::{Controller, ControllerSettings},
    session::Session,
};
use serde_json::{Value, json};

pub const TOKEN: &str = "abc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub auth: Option<String>,
}

impl Recorded {
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug)]
pub struct Backend {
    pub users: HashMap<String, String>,
    pub owner: String,
    pub accounts: Vec<Value>,
    pub statements: HashMap<AccountId, Vec<Value>>,
    /// Forced responses keyed by `"METHOD /path"`.
    pub failures: HashMap<String, (StatusCode, String)>,
    /// Delays applied before answering, keyed by `"METHOD /path"`.
    pub delays: HashMap<String, Duration>,
    pub requests: Vec<Recorded>,
    next_id: i64,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            users: HashMap::from([("alice".to_string(), "secret".to_string())]),
            owner: "alice".to_string(),
            accounts: Vec::new(),
            statements: HashMap::new(),
            failures: HashMap::new(),
            delays: HashMap::new(),
            requests: Vec::new(),
            next_id: 1,
        }
    }
}

impl Backend {
    /// Backend with one account (id 1) holding `balance`.
    pub fn with_account(balance: f64) -> Self {
        let mut backend = Self::default();
        backend.accounts.push(json!({"id": 1, "owner": "alice", "balance": balance}));
        backend.statements.insert(
            1,
            vec![json!({
                "id": 1,
                "type": "deposit",
                "amount": balance,
                "timestamp": "2025-03-01T10:00:00.123456"
            })],
        );
        backend.next_id = 2;
        backend
    }

    pub fn fail(&mut self, route: &str, status: StatusCode, body: &str) {
        self.failures
            .insert(route.to_string(), (status, body.to_string()));
    }

    pub fn delay(&mut self, route: &str, delay: Duration) {
        self.delays.insert(route.to_string(), delay);
    }
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct TestServer {
    pub backend: Shared,
    pub base_url: String,
}

impl TestServer {
    pub async fn start(backend: Backend) -> Self {
        let backend = Arc::new(Mutex::new(backend));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(backend.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            backend,
            base_url: format!("http://{addr}/api/"),
        }
    }

    pub fn controller(&self, session: Session) -> Controller {
        controller_for(&self.base_url, session, ControllerSettings::default())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.backend.lock().unwrap().requests.clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.requests().iter().map(Recorded::route).collect()
    }

    pub fn clear_requests(&self) {
        self.backend.lock().unwrap().requests.clear();
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.backend.lock().unwrap())
    }
}

pub fn controller_for(base_url: &str, session: Session, settings: ControllerSettings) -> Controller {
    let client = Client::new(base_url, session).unwrap();
    Controller::new(client, settings)
}

/// Base URL of a port nobody listens on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/")
}

pub fn session_with(token: &str) -> Session {
    let session = Session::in_memory();
    session.set(Some(token));
    session
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/me", get(me))
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route("/api/accounts/{id}/transactions", post(create_transaction))
        .route("/api/accounts/{id}/statement", get(statement))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        auth: request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };
    let (delay, forced) = {
        let mut backend = state.lock().unwrap();
        let route = recorded.route();
        let delay = backend.delays.get(&route).copied();
        let forced = backend.failures.get(&route).cloned();
        backend.requests.push(recorded);
        (delay, forced)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some((status, body)) = forced {
        return (status, body).into_response();
    }
    next.run(request).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        Some(_) => Err(detail(StatusCode::UNAUTHORIZED, "Token inválido")),
        None => Err(detail(
            StatusCode::UNAUTHORIZED,
            "Token de autenticação ausente",
        )),
    }
}

async fn login(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let backend = state.lock().unwrap();
    if backend.users.get(&body.username) == Some(&body.password) {
        return Json(json!({ "access_token": TOKEN })).into_response();
    }
    detail(StatusCode::UNAUTHORIZED, "Usuário ou senha inválidos")
}

async fn register(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut backend = state.lock().unwrap();
    if backend.users.contains_key(&body.username) {
        return detail(StatusCode::BAD_REQUEST, "Usuário já existe");
    }
    backend
        .users
        .insert(body.username.clone(), body.password.clone());
    Json(json!({ "username": body.username })).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(res) = authorized(&headers) {
        return res;
    }
    let backend = state.lock().unwrap();
    Json(json!({ "username": backend.owner })).into_response()
}

async fn list_accounts(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(res) = authorized(&headers) {
        return res;
    }
    let backend = state.lock().unwrap();
    Json(Value::Array(backend.accounts.clone())).into_response()
}

async fn create_account(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(res) = authorized(&headers) {
        return res;
    }
    let mut backend = state.lock().unwrap();
    let id = backend.next_id;
    backend.next_id += 1;
    let account = json!({ "id": id, "owner": backend.owner, "balance": 0.0 });
    backend.accounts.push(account.clone());
    Json(account).into_response()
}

async fn create_transaction(
    State(state): State<Shared>,
    Path(id): Path<AccountId>,
    headers: HeaderMap,
    Json(body): Json<OperationNew>,
) -> Response {
    if let Err(res) = authorized(&headers) {
        return res;
    }
    let mut backend = state.lock().unwrap();
    if body.amount <= 0.0 {
        return detail(StatusCode::BAD_REQUEST, "Valor inválido");
    }
    let Some(account) = backend
        .accounts
        .iter_mut()
        .find(|account| account["id"] == json!(id))
    else {
        return detail(StatusCode::NOT_FOUND, "Conta não encontrada");
    };
    let balance = account["balance"].as_f64().unwrap_or_default();
    let kind = body.kind.as_str();
    let balance = if kind == "withdraw" {
        if balance < body.amount {
            return detail(StatusCode::BAD_REQUEST, "Saldo insuficiente");
        }
        balance - body.amount
    } else {
        balance + body.amount
    };
    account["balance"] = json!(balance);

    let tx_id = backend.next_id;
    backend.next_id += 1;
    let transaction = json!({
        "id": tx_id,
        "type": kind,
        "amount": body.amount,
        "timestamp": "2025-03-02T09:30:00.000001"
    });
    backend
        .statements
        .entry(id)
        .or_default()
        .push(transaction.clone());

    Json(json!({
        "message": "Transação realizada com sucesso",
        "transaction": transaction,
        "balance": balance
    }))
    .into_response()
}

async fn statement(
    State(state): State<Shared>,
    Path(id): Path<AccountId>,
    headers: HeaderMap,
) -> Response {
    if let Err(res) = authorized(&headers) {
        return res;
    }
    let backend = state.lock().unwrap();
    if !backend.accounts.iter().any(|account| account["id"] == json!(id)) {
        return detail(StatusCode::NOT_FOUND, "Conta não encontrada");
    }
    let rows = backend.statements.get(&id).cloned().unwrap_or_default();
    Json(Value::Array(rows)).into_response()
}
