use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct SessionResponse {
    session_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CreateCustomerRequest {
    username: String,
    password: String,
    init_amount: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/{id}/login", post(login))
        .route("/v1/customers", post(create_customer))
}

/// Issue a fresh, unauthenticated session. The opaque id is the caller's
/// handle for every session-scoped operation.
async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session_id = state.create_session().await;
    Json(SessionResponse { session_id })
}

async fn login(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<CredentialsRequest>,
) -> Result<String, AppError> {
    let session = state
        .session(session_id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("unknown session {}", session_id)))?;
    let mut session = session.lock().await;

    Ok(state
        .engine
        .login(&mut session, &req.username, &req.password)
        .await)
}

async fn create_customer(
    State(state): State<AppState>,
    Json(req): Json<CreateCustomerRequest>,
) -> String {
    state
        .engine
        .create_customer(&req.username, &req.password, req.init_amount)
        .await
}
