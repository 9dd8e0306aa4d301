//! Error types for the quiz core and its collaborators.

use thiserror::Error;

/// Errors raised by quiz session transitions.
///
/// Everything except `InsufficientRoster` is a call outside the transition's
/// precondition; the session is left untouched in every case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
  #[error("roster has {available} unique candidates; at least 4 are needed to build options")]
  InsufficientRoster { available: usize },
  #[error("a round is already in progress")]
  RoundInProgress,
  #[error("no round is in progress")]
  NoActiveRound,
  #[error("an option was already selected this round")]
  AlreadySelected,
  #[error("no option has been selected this round")]
  NothingSelected,
  #[error("the game is over")]
  GameOver,
  #[error("'{0}' is not one of this round's options")]
  UnknownOption(String),
}

/// The roster could not be loaded (network or page structure problem).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RosterError {
  #[error("roster request failed with status {0}")]
  HttpStatus(reqwest::StatusCode),
  #[error(transparent)]
  Http(#[from] reqwest::Error),
  #[error("invalid selector: {0}")]
  Selector(String),
  #[error("roster page has no listing table")]
  NoTable,
  #[error("roster page yielded no candidates")]
  Empty,
}

/// The description service could not produce text for a name.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DescriptionError {
  #[error("description service is not configured")]
  Disabled,
  #[error("description service returned an empty response")]
  EmptyResponse,
  #[error("description request failed with status {status}: {message}")]
  HttpStatus { status: reqwest::StatusCode, message: String },
  #[error(transparent)]
  Http(#[from] reqwest::Error),
}

/// Errors surfaced by the game driver to the HTTP/WebSocket layers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameError {
  #[error("unknown session: {0}")]
  UnknownSession(String),
  #[error(transparent)]
  Quiz(#[from] QuizError),
  #[error(transparent)]
  Roster(#[from] RosterError),
}
