//! Description provider: memoized clue text per candidate name.
//!
//! Successful descriptions are kept for the process lifetime, keyed by the exact
//! name. Failures are not cached so a later round may retry.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::Prompts;
use crate::error::DescriptionError;
use crate::openai::OpenAI;

pub struct DescriptionProvider {
  openai: Option<OpenAI>,
  prompts: Prompts,
  cache: RwLock<HashMap<String, String>>,
}

impl DescriptionProvider {
  /// `preset` pre-fills the cache (clues configured alongside a local roster).
  pub fn new(openai: Option<OpenAI>, prompts: Prompts, preset: HashMap<String, String>) -> Self {
    Self { openai, prompts, cache: RwLock::new(preset) }
  }

  pub fn is_enabled(&self) -> bool { self.openai.is_some() }

  #[instrument(level = "debug", skip(self))]
  pub async fn describe(&self, name: &str) -> Result<String, DescriptionError> {
    if let Some(hit) = { self.cache.read().await.get(name).cloned() } {
      debug!(target: "portrait_quiz", %name, "Description cache hit");
      return Ok(hit);
    }
    let oa = self.openai.as_ref().ok_or(DescriptionError::Disabled)?;
    let text = oa.describe_candidate(&self.prompts, name).await?;
    self.cache.write().await.insert(name.to_string(), text.clone());
    Ok(text)
  }
}

/// Turn model output into display clues: one per non-empty line, minus the
/// model's own preamble ("Here are ...") and heading lines ending with ':'.
pub fn extract_clues(text: &str) -> Vec<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .filter(|l| !l.to_lowercase().starts_with("here are"))
    .filter(|l| !l.ends_with(':'))
    .map(str::to_string)
    .collect()
}
