//! HTTP JSON API over a shared Workspace.
//!
//! Workspace access and the analyzer call are blocking (SQLite, blocking
//! reqwest), so every handler hops onto the blocking pool.

use crate::views::{TreeView, UiState};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use evaluation_core::{
    analysis::Analyzer,
    auth::Session,
    dataset::Dataset,
    error::EvalError,
    model::Employee,
    rubric::ScoreInput,
    workspace::Workspace,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

pub type SharedAnalyzer = Arc<dyn Analyzer + Send + Sync>;

/// Bearer tokens expire this long after login.
const SESSION_TTL_HOURS: i64 = 12;

#[derive(Clone)]
struct AppState {
    workspace: Arc<Mutex<Workspace>>,
    sessions: Arc<Mutex<SessionTable>>,
    analyzer: SharedAnalyzer,
}

// ── Sessions ─────────────────────────────────────────────────────────────────

/// Bearer token to session. Expired entries are dropped on lookup and on
/// every new login.
struct SessionTable {
    ttl: Duration,
    sessions: HashMap<String, Session>,
}

impl SessionTable {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: HashMap::new(),
        }
    }

    fn expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.started_at >= self.ttl
    }

    fn issue(&mut self, session: Session, now: DateTime<Utc>) -> String {
        let ttl = self.ttl;
        self.sessions.retain(|_, s| now - s.started_at < ttl);
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), session);
        token
    }

    fn get(&mut self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let session = self.sessions.get(token)?;
        if self.expired(session, now) {
            log::debug!("Session for {} expired", session.viewer_id);
            self.sessions.remove(token);
            return None;
        }
        Some(session.clone())
    }

    fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.len()
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Login required".into(),
        }
    }
}

impl From<EvalError> for ApiError {
    fn from(e: EvalError) -> Self {
        let status = match &e {
            EvalError::UnknownEmployee { .. }
            | EvalError::UnknownEvaluation { .. }
            | EvalError::UnknownDepartment { .. } => StatusCode::NOT_FOUND,
            EvalError::SelfEvaluation { .. } | EvalError::NotSubordinate { .. } => StatusCode::FORBIDDEN,
            EvalError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            EvalError::ScoreOutOfRange { .. }
            | EvalError::MissingScore { .. }
            | EvalError::DuplicateScore { .. }
            | EvalError::UnknownCriterion { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EvalError::DepartmentInUse { .. }
            | EvalError::DuplicateDepartment { .. }
            | EvalError::HierarchyCycle { .. } => StatusCode::CONFLICT,
            EvalError::Database(_) | EvalError::Serialization(_) | EvalError::Other(_) => {
                log::error!("Request failed: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

// ── Plumbing ─────────────────────────────────────────────────────────────────

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(ApiError::unauthorized)
}

fn lock_sessions(state: &AppState) -> Result<std::sync::MutexGuard<'_, SessionTable>, ApiError> {
    state
        .sessions
        .lock()
        .map_err(|_| ApiError::internal("session lock poisoned"))
}

fn session_from(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let token = bearer_token(headers)?;
    lock_sessions(state)?
        .get(token, Utc::now())
        .ok_or_else(ApiError::unauthorized)
}

/// Run `f` against the workspace on the blocking pool.
async fn with_workspace<F>(state: &AppState, f: F) -> ApiResult
where
    F: FnOnce(&mut Workspace, &dyn Analyzer) -> Result<Value, ApiError> + Send + 'static,
{
    let workspace = state.workspace.clone();
    let analyzer = state.analyzer.clone();
    tokio::task::spawn_blocking(move || {
        let mut ws = workspace
            .lock()
            .map_err(|_| ApiError::internal("workspace lock poisoned"))?;
        f(&mut ws, analyzer.as_ref()).map(Json)
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct LoginRequest {
    identity: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    session: Session,
}

async fn login_handler(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult {
    let sessions = state.sessions.clone();
    with_workspace(&state, move |ws, _| {
        let session = ws.login(&req.identity, &req.password)?;
        let token = sessions
            .lock()
            .map_err(|_| ApiError::internal("session lock poisoned"))?
            .issue(session.clone(), Utc::now());
        Ok(serde_json::to_value(LoginResponse { token, session })?)
    })
    .await
}

async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let token = bearer_token(&headers)?;
    let revoked = lock_sessions(&state)?.revoke(token);
    Ok(Json(json!({ "ok": revoked })))
}

async fn state_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let session = session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| Ok(serde_json::to_value(UiState::build(ws, Some(&session))?)?)).await
}

async fn get_data_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, |ws, _| Ok(serde_json::to_value(ws.dataset())?)).await
}

async fn put_data_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(dataset): Json<Dataset>,
) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| Ok(serde_json::to_value(ws.replace_dataset(dataset))?)).await
}

async fn tree_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, |ws, _| Ok(serde_json::to_value(TreeView::build(ws))?)).await
}

async fn stats_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, |ws, _| Ok(serde_json::to_value(ws.stats())?)).await
}

async fn rubric_handler(State(state): State<AppState>) -> ApiResult {
    with_workspace(&state, |ws, _| Ok(serde_json::to_value(&ws.config.rubric)?)).await
}

async fn list_evaluations_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let session = session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| {
        Ok(serde_json::to_value(ws.visible_evaluations(&session)?)?)
    })
    .await
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationRequest {
    employee_id: String,
    scores: Vec<ScoreInput>,
}

async fn create_evaluation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EvaluationRequest>,
) -> ApiResult {
    let session = session_from(&state, &headers)?;
    with_workspace(&state, move |ws, analyzer| {
        let (evaluation, outcome) = ws.submit_evaluation(
            &session,
            &req.employee_id,
            &req.scores,
            analyzer,
            chrono::Utc::now(),
        )?;
        Ok(json!({ "evaluation": evaluation, "outcome": outcome }))
    })
    .await
}

async fn delete_evaluation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| Ok(serde_json::to_value(ws.delete_evaluation(&id)?)?)).await
}

#[derive(Deserialize)]
struct DepartmentRequest {
    name: String,
}

async fn add_department_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DepartmentRequest>,
) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| Ok(serde_json::to_value(ws.add_department(&req.name)?)?)).await
}

async fn rename_department_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(old): Path<String>,
    Json(req): Json<DepartmentRequest>,
) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| {
        Ok(serde_json::to_value(ws.rename_department(&old, &req.name)?)?)
    })
    .await
}

async fn remove_department_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| Ok(serde_json::to_value(ws.remove_department(&name)?)?)).await
}

async fn upsert_employee_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(employee): Json<Employee>,
) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| Ok(serde_json::to_value(ws.upsert_employee(employee)?)?)).await
}

async fn remove_employee_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| Ok(serde_json::to_value(ws.remove_employee(&id)?)?)).await
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let session = session_from(&state, &headers)?;
    with_workspace(&state, move |ws, _| {
        ws.reload()?;
        Ok(serde_json::to_value(UiState::build(ws, Some(&session))?)?)
    })
    .await
}

// ── Server ───────────────────────────────────────────────────────────────────

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/rubric", get(rubric_handler))
        .route("/api/state", get(state_handler))
        .route("/api/data", get(get_data_handler).put(put_data_handler))
        .route("/api/tree", get(tree_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/reload", post(reload_handler))
        .route(
            "/api/evaluations",
            get(list_evaluations_handler).post(create_evaluation_handler),
        )
        .route("/api/evaluations/:id", delete(delete_evaluation_handler))
        .route("/api/departments", post(add_department_handler))
        .route(
            "/api/departments/:name",
            put(rename_department_handler).delete(remove_department_handler),
        )
        .route("/api/employees", post(upsert_employee_handler))
        .route("/api/employees/:id", delete(remove_employee_handler))
        .with_state(state)
}

pub async fn serve(workspace: Workspace, analyzer: SharedAnalyzer, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState {
        workspace: Arc::new(Mutex::new(workspace)),
        sessions: Arc::new(Mutex::new(SessionTable::new(Duration::hours(SESSION_TTL_HOURS)))),
        analyzer,
    };
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Evaluation API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(viewer: &str, started_at: DateTime<Utc>) -> Session {
        Session {
            viewer_id: viewer.to_string(),
            started_at,
        }
    }

    #[test]
    fn logout_revokes_token() {
        let now = Utc::now();
        let mut table = SessionTable::new(Duration::hours(1));
        let token = table.issue(session("5", now), now);
        assert_eq!(table.get(&token, now).map(|s| s.viewer_id), Some("5".to_string()));

        assert!(table.revoke(&token));
        assert!(table.get(&token, now).is_none());
        assert!(!table.revoke(&token), "second logout is a no-op");
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let start = Utc::now();
        let mut table = SessionTable::new(Duration::hours(1));
        let stale = table.issue(session("2", start), start);

        let later = start + Duration::hours(2);
        assert!(table.get(&stale, later).is_none());
        assert_eq!(table.len(), 0);

        let old = table.issue(session("3", start), start);
        let fresh = table.issue(session("4", later), later);
        assert_eq!(table.len(), 1, "login prunes expired tokens");
        assert!(table.get(&old, later).is_none());
        assert!(table.get(&fresh, later).is_some());
    }
}
