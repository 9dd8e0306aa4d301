//! HTTP endpoint handlers. These are thin wrappers that forward to the game driver.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument};

use crate::error::{GameError, QuizError};
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

impl IntoResponse for GameError {
  fn into_response(self) -> Response {
    let status = match &self {
      GameError::UnknownSession(_) => StatusCode::NOT_FOUND,
      GameError::Quiz(QuizError::InsufficientRoster { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
      GameError::Quiz(_) => StatusCode::CONFLICT,
      GameError::Roster(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
      error!(target: "portrait_quiz", error = %self, %status, "Request failed");
    }
    (status, Json(ErrorOut { error: self.to_string() })).into_response()
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    descriptions: state.descriptions.is_enabled(),
    sessions: state.session_count().await,
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_roster(State(state): State<Arc<AppState>>) -> Result<Json<RosterOut>, GameError> {
  let roster = state.roster.roster().await?;
  Ok(Json(RosterOut { source: roster.source(), candidates: roster.candidates().to_vec() }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(
  State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionOut>), GameError> {
  let entry = logic::new_game(&state).await?;
  let out = to_out(&entry);
  state.insert_session(entry).await;
  info!(target: "quiz", id = %out.id, "HTTP session created");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, GameError> {
  let session = state.get_session(&id).await?;
  let entry = session.lock().await;
  Ok(Json(to_out(&entry)))
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name))]
pub async fn http_select(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<SelectIn>,
) -> Result<Json<SessionOut>, GameError> {
  let session = state.get_session(&id).await?;
  let mut entry = session.lock().await;
  logic::select(&mut entry, &body.name)?;
  Ok(Json(to_out(&entry)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_advance(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, GameError> {
  let session = state.get_session(&id).await?;
  let mut entry = session.lock().await;
  logic::advance(&state, &mut entry).await?;
  Ok(Json(to_out(&entry)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_reset(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, GameError> {
  let session = state.get_session(&id).await?;
  let mut entry = session.lock().await;
  logic::play_again(&state, &mut entry).await?;
  Ok(Json(to_out(&entry)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, GameError> {
  state.remove_session(&id).await?;
  info!(target: "quiz", %id, "HTTP session deleted");
  Ok(StatusCode::NO_CONTENT)
}
