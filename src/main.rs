//! Portrait Quiz · Head-of-State Trivia Backend
//!
//! - Axum HTTP + WebSocket API driving ten-round "who is this?" games
//! - Roster scraped once from a listing page (or supplied in config)
//! - Optional OpenAI-compatible clue generation (via environment variables)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   OPENAI_API_KEY    : enables clue generation if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1"
//!   OPENAI_MODEL      : default "gpt-4o-mini"
//!   QUIZ_CONFIG_PATH  : path to TOML config (settings, prompts, optional local roster)
//!   QUIZ_SEED         : u64 seed for reproducible games
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod session;
mod roster;
mod openai;
mod describe;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::QuizError;
use crate::routes::build_router;
use crate::session::OPTIONS_PER_ROUND;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Providers, session store, RNG.
  let state = Arc::new(AppState::from_env()?);

  // The roster is loaded once up front; without it no round can ever start.
  let roster = match state.roster.roster().await {
    Ok(r) => r,
    Err(e) => {
      error!(target: "portrait_quiz", error = %e, "Roster unavailable; refusing to start");
      return Err(e.into());
    }
  };
  if roster.len() < OPTIONS_PER_ROUND {
    let e = QuizError::InsufficientRoster { available: roster.len() };
    error!(target: "portrait_quiz", error = %e, "Roster too small; refusing to start");
    return Err(e.into());
  }
  info!(target: "portrait_quiz", candidates = roster.len(), source = ?roster.source(), "Roster ready");

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "portrait_quiz", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "portrait_quiz", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "portrait_quiz", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
