//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, RosterSource};
use crate::session::{Phase, ROUNDS_PER_GAME};
use crate::state::SessionEntry;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewGame,
    Select { name: String },
    Advance,
    PlayAgain,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session { session: SessionOut },
    Error { message: String },
}

/// Client-facing view of a session, used by both WS and HTTP.
///
/// `correct` stays empty until the player has picked an option.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionOut {
    pub id: String,
    pub phase: Phase,
    pub question: Option<u32>,
    pub rounds: u32,
    pub score: u32,
    pub progress: f32,
    pub portrait: Option<String>,
    pub clues: Vec<String>,
    pub options: Vec<String>,
    pub selected: Option<String>,
    pub feedback: Option<String>,
    pub correct: Option<String>,
    pub summary: Option<String>,
}

/// Render a session entry to the public DTO.
pub fn to_out(entry: &SessionEntry) -> SessionOut {
    let s = &entry.state;
    let revealed = s.selected().is_some();
    SessionOut {
        id: entry.id.clone(),
        phase: s.phase(),
        question: s.question_number(),
        rounds: ROUNDS_PER_GAME,
        score: s.score(),
        progress: s.progress(),
        portrait: s.current().map(|c| c.portrait.clone()),
        clues: entry.clues.clone(),
        options: s.options().iter().map(|c| c.name.clone()).collect(),
        selected: s.selected().map(str::to_string),
        feedback: s.feedback().map(str::to_string),
        correct: s.current().filter(|_| revealed).map(|c| c.name.clone()),
        summary: s.summary(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize, Serialize)]
pub struct SelectIn {
    pub name: String,
}

#[derive(Serialize)]
pub struct RosterOut {
    pub source: RosterSource,
    pub candidates: Vec<Candidate>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub descriptions: bool,
    pub sessions: usize,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}
