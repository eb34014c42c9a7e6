use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ReservationRequest {
    reservation_id: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{id}/pay", post(pay))
        .route("/v1/sessions/{id}/reservations", get(list_reservations))
        .route("/v1/sessions/{id}/cancel", post(cancel))
}

async fn pay(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ReservationRequest>,
) -> Result<String, AppError> {
    let session = state
        .session(session_id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("unknown session {}", session_id)))?;
    let session = session.lock().await;

    Ok(state.engine.pay(&session, req.reservation_id).await)
}

async fn list_reservations(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<String, AppError> {
    let session = state
        .session(session_id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("unknown session {}", session_id)))?;
    let session = session.lock().await;

    Ok(state.engine.reservations(&session).await)
}

async fn cancel(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ReservationRequest>,
) -> Result<String, AppError> {
    let session = state
        .session(session_id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("unknown session {}", session_id)))?;
    let session = session.lock().await;

    Ok(state.engine.cancel(&session, req.reservation_id).await)
}
