//! Quiz session state machine and option generation.
//!
//! Per round:
//!   NoActiveRound -> start_round -> AwaitingSelection -> select_option
//!   -> ShowingFeedback -> advance_round -> NoActiveRound
//!
//! `start_round` enters the terminal `GameOver` phase instead of starting a round
//! once ten rounds were played or every candidate has been used. `reset` goes
//! back to a fresh `NoActiveRound`.
//!
//! The session performs no I/O. Randomness comes from the caller's `Rng` so
//! tests (and seeded deployments) are reproducible.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, Roster};
use crate::error::QuizError;

pub const ROUNDS_PER_GAME: u32 = 10;
/// One correct candidate plus three distractors.
pub const OPTIONS_PER_ROUND: usize = 4;
const DISTRACTORS_PER_ROUND: usize = OPTIONS_PER_ROUND - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  NoActiveRound,
  AwaitingSelection,
  ShowingFeedback,
  GameOver,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
  score: u32,
  round_index: u32,
  used_names: HashSet<String>,
  current: Option<Candidate>,
  options: Vec<Candidate>,
  selected: Option<String>,
  feedback: Option<String>,
  is_over: bool,
}

impl SessionState {
  pub fn new() -> Self { Self::default() }

  pub fn score(&self) -> u32 { self.score }
  pub fn round_index(&self) -> u32 { self.round_index }
  pub fn used_names(&self) -> &HashSet<String> { &self.used_names }
  pub fn current(&self) -> Option<&Candidate> { self.current.as_ref() }
  pub fn options(&self) -> &[Candidate] { &self.options }
  pub fn selected(&self) -> Option<&str> { self.selected.as_deref() }
  pub fn feedback(&self) -> Option<&str> { self.feedback.as_deref() }
  pub fn is_over(&self) -> bool { self.is_over }

  pub fn phase(&self) -> Phase {
    if self.is_over {
      Phase::GameOver
    } else if self.current.is_none() {
      Phase::NoActiveRound
    } else if self.selected.is_none() {
      Phase::AwaitingSelection
    } else {
      Phase::ShowingFeedback
    }
  }

  /// Fraction of the game already played, 0.0..=1.0.
  pub fn progress(&self) -> f32 {
    self.round_index.min(ROUNDS_PER_GAME) as f32 / ROUNDS_PER_GAME as f32
  }

  /// 1-based number of the question on screen; none once the game is over.
  pub fn question_number(&self) -> Option<u32> {
    (!self.is_over).then_some(self.round_index + 1)
  }

  pub fn summary(&self) -> Option<String> {
    self.is_over.then(|| format!("Game Over! You scored {} out of {}.", self.score, ROUNDS_PER_GAME))
  }

  /// Begin the next round, or detect that the game is over.
  ///
  /// Fails with `InsufficientRoster` before touching any state when the roster
  /// cannot supply three distractors.
  pub fn start_round<R: Rng + ?Sized>(&mut self, roster: &Roster, rng: &mut R) -> Result<Phase, QuizError> {
    if self.is_over {
      return Err(QuizError::GameOver);
    }
    if self.current.is_some() {
      return Err(QuizError::RoundInProgress);
    }

    let remaining: Vec<&Candidate> = roster
      .candidates()
      .iter()
      .filter(|c| !self.used_names.contains(&c.name))
      .collect();

    if remaining.is_empty() || self.round_index >= ROUNDS_PER_GAME {
      self.is_over = true;
      return Ok(Phase::GameOver);
    }
    if roster.len() < OPTIONS_PER_ROUND {
      return Err(QuizError::InsufficientRoster { available: roster.len() });
    }

    let correct = remaining
      .choose(rng)
      .map(|c| (*c).clone())
      .ok_or(QuizError::InsufficientRoster { available: roster.len() })?;

    let others: Vec<&Candidate> = roster
      .candidates()
      .iter()
      .filter(|c| c.name != correct.name)
      .collect();
    let mut options: Vec<Candidate> = others
      .choose_multiple(rng, DISTRACTORS_PER_ROUND)
      .map(|c| (*c).clone())
      .collect();
    if options.len() < DISTRACTORS_PER_ROUND {
      return Err(QuizError::InsufficientRoster { available: roster.len() });
    }
    options.push(correct.clone());
    options.shuffle(rng);

    self.used_names.insert(correct.name.clone());
    self.current = Some(correct);
    self.options = options;
    self.selected = None;
    self.feedback = None;
    Ok(Phase::AwaitingSelection)
  }

  /// Record the user's pick and score it. Returns whether it was correct.
  pub fn select_option(&mut self, chosen: &str) -> Result<bool, QuizError> {
    let correct_name = match (&self.current, self.is_over) {
      (_, true) => return Err(QuizError::GameOver),
      (None, false) => return Err(QuizError::NoActiveRound),
      (Some(c), false) => c.name.clone(),
    };
    if self.selected.is_some() {
      return Err(QuizError::AlreadySelected);
    }
    if !self.options.iter().any(|o| o.name == chosen) {
      return Err(QuizError::UnknownOption(chosen.to_string()));
    }

    let is_correct = chosen == correct_name;
    self.selected = Some(chosen.to_string());
    if is_correct {
      self.score += 1;
      self.feedback = Some("✅ Correct!".into());
    } else {
      self.feedback = Some(format!("❌ Nope! It was {correct_name}."));
    }
    Ok(is_correct)
  }

  /// Close the answered round. The caller follows up with `start_round`.
  pub fn advance_round(&mut self) -> Result<(), QuizError> {
    if self.selected.is_none() {
      return Err(QuizError::NothingSelected);
    }
    self.round_index += 1;
    self.current = None;
    self.options.clear();
    self.selected = None;
    self.feedback = None;
    Ok(())
  }

  /// Back to a fresh game ("play again").
  pub fn reset(&mut self) {
    *self = Self::default();
  }
}
