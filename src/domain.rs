//! Domain models used by the backend: candidates, where the roster came from, and the roster itself.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A quiz subject: display name (unique key) plus a portrait reference.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Candidate {
  pub name: String,
  pub portrait: String,
}

impl Candidate {
  pub fn new(name: impl Into<String>, portrait: impl Into<String>) -> Self {
    Self { name: name.into(), portrait: portrait.into() }
  }
}

/// Where did we get the roster from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RosterSource {
  Scraped,    // listing page fetched at startup
  LocalBank,  // `[[roster]]` entries from the TOML config
}

/// Ordered, name-unique set of candidates. Read-only once built.
#[derive(Clone, Debug)]
pub struct Roster {
  candidates: Vec<Candidate>,
  source: RosterSource,
}

impl Roster {
  /// Build a roster, keeping the first occurrence of each name.
  pub fn new(candidates: impl IntoIterator<Item = Candidate>, source: RosterSource) -> Self {
    let mut seen = HashSet::new();
    let candidates = candidates
      .into_iter()
      .filter(|c| seen.insert(c.name.clone()))
      .collect();
    Self { candidates, source }
  }

  pub fn candidates(&self) -> &[Candidate] { &self.candidates }

  pub fn source(&self) -> RosterSource { self.source }

  pub fn len(&self) -> usize { self.candidates.len() }

  pub fn is_empty(&self) -> bool { self.candidates.is_empty() }
}
