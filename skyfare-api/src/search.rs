use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use skyfare_core::search::SearchRequest;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/sessions/{id}/search", post(search))
}

async fn search(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SearchRequest>,
) -> Result<String, AppError> {
    let session = state
        .session(session_id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("unknown session {}", session_id)))?;
    let mut session = session.lock().await;

    Ok(state.engine.search(&mut session, &req).await)
}
