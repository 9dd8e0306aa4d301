//! Game driver shared by both HTTP and WebSocket handlers.
//!
//! Each function applies exactly one user-visible transition to a session entry:
//!   - starting a game (first round)
//!   - selecting an option
//!   - advancing to the next round (or detecting game over)
//!   - playing again
//!
//! Whenever a new round begins, clues for its candidate are looked up through the
//! description provider. A missing description never blocks the round.

use tracing::{info, instrument, warn};

use crate::describe::extract_clues;
use crate::error::{GameError, QuizError};
use crate::session::Phase;
use crate::state::{AppState, SessionEntry};

/// Start the next round (or end the game) and refresh the clues.
#[instrument(level = "info", skip(state, entry), fields(id = %entry.id, round = entry.state.round_index()))]
pub async fn begin_round(state: &AppState, entry: &mut SessionEntry) -> Result<Phase, GameError> {
  let roster = state.roster.roster().await?;
  let phase = entry.state.start_round(&roster, &mut entry.rng)?;
  entry.clues.clear();

  match entry.state.current() {
    Some(candidate) if phase == Phase::AwaitingSelection => {
      let name = candidate.name.clone();
      entry.clues = load_clues(state, &name).await;
      info!(target: "quiz", id = %entry.id, question = ?entry.state.question_number(), used = entry.state.used_names().len(), clues = entry.clues.len(), "Round started");
    }
    _ => {
      info!(target: "quiz", id = %entry.id, over = entry.state.is_over(), score = entry.state.score(), rounds = entry.state.round_index(), "Game over");
    }
  }
  Ok(phase)
}

async fn load_clues(state: &AppState, name: &str) -> Vec<String> {
  match state.descriptions.describe(name).await {
    Ok(text) => extract_clues(&text),
    Err(e) => {
      warn!(target: "quiz", %name, error = %e, "Description unavailable; round continues without clues");
      Vec::new()
    }
  }
}

/// New session with its first round already started.
#[instrument(level = "info", skip(state))]
pub async fn new_game(state: &AppState) -> Result<SessionEntry, GameError> {
  let mut entry = state.new_entry().await;
  begin_round(state, &mut entry).await?;
  Ok(entry)
}

#[instrument(level = "info", skip(entry), fields(id = %entry.id))]
pub fn select(entry: &mut SessionEntry, name: &str) -> Result<bool, QuizError> {
  let correct = entry.state.select_option(name)?;
  info!(target: "quiz", id = %entry.id, %correct, score = entry.state.score(), "Option selected");
  Ok(correct)
}

/// Close the answered round and start the next one (or end the game).
#[instrument(level = "info", skip(state, entry), fields(id = %entry.id))]
pub async fn advance(state: &AppState, entry: &mut SessionEntry) -> Result<Phase, GameError> {
  entry.state.advance_round()?;
  begin_round(state, entry).await
}

/// Reset the session in place and start a fresh game.
#[instrument(level = "info", skip(state, entry), fields(id = %entry.id))]
pub async fn play_again(state: &AppState, entry: &mut SessionEntry) -> Result<Phase, GameError> {
  entry.state.reset();
  entry.clues.clear();
  begin_round(state, entry).await
}
