use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct BookRequest {
    /// Position in the session's most recent search results.
    itinerary_id: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/sessions/{id}/book", post(book))
}

async fn book(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<BookRequest>,
) -> Result<String, AppError> {
    let session = state
        .session(session_id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("unknown session {}", session_id)))?;
    let mut session = session.lock().await;

    Ok(state.engine.book(&mut session, req.itinerary_id).await)
}
