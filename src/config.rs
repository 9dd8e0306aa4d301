//! Loading quiz configuration (settings + prompts + optional local roster) from TOML.
//!
//! See `QuizConfig` and `Prompts` for expected schema. Every section is optional.

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_ROSTER_URL: &str = "https://en.wikipedia.org/wiki/List_of_presidents_of_the_United_States";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub quiz: QuizSettings,
  #[serde(default)]
  pub prompts: Prompts,
  /// Local roster bank. When non-empty it replaces the scraped listing.
  #[serde(default)]
  pub roster: Vec<CandidateCfg>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
  pub roster_url: String,
  /// Pause between showing feedback and the next question on WebSocket sessions.
  /// `None` (or 0) means the client advances explicitly.
  pub auto_advance_ms: Option<u64>,
  /// Process-level RNG seed; `QUIZ_SEED` overrides it.
  pub seed: Option<u64>,
  /// HTTP sessions untouched for longer than this are dropped.
  pub session_ttl_secs: u64,
}

impl Default for QuizSettings {
  fn default() -> Self {
    Self {
      roster_url: DEFAULT_ROSTER_URL.into(),
      auto_advance_ms: Some(1000),
      seed: None,
      session_ttl_secs: 1800,
    }
  }
}

/// Roster entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct CandidateCfg {
  pub name: String,
  pub portrait: String,
  /// Optional fixed clue text; skips the description service for this name.
  #[serde(default)]
  pub clues: Option<String>,
}

/// Prompts used by the description client.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub describe_system: String,
  pub describe_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      describe_system: "You write short quiz clues about historical heads of state. Output only the clues, one per line.".into(),
      describe_user_template: "Please write three descriptive sentences of up to 200 characters about {name}. \
The sentences should mention unique features of the president, and can mention events and matters he dealt with, \
but must not disclose his identity directly (no predecessor or successor, no number of his presidency, no years of his tenure, etc.), \
and must not use general statements such as 'he was an outstanding diplomat/speaker' that could fit many others as well.".into(),
    }
  }
}

impl QuizConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(s)
  }

  /// Effective seed: `QUIZ_SEED` env var first, then the config file.
  pub fn seed(&self) -> Option<u64> {
    std::env::var("QUIZ_SEED")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .or(self.quiz.seed)
  }
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match QuizConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "portrait_quiz", %path, local_roster = cfg.roster.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "portrait_quiz", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "portrait_quiz", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
