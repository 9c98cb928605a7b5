//! Session queue state definitions

use serde::{Deserialize, Serialize};

/// States of the session queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueState {
    /// No candidates: freshly constructed, or the last fetch came back empty
    Empty,
    /// A discovery fetch is outstanding
    Loading,
    /// Cursor points at a valid candidate
    Presenting,
    /// A confirmed rating is moving the cursor forward
    Advancing,
}

impl QueueState {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            QueueState::Empty => "\x1b[90m",      // Gray
            QueueState::Loading => "\x1b[33m",    // Yellow
            QueueState::Presenting => "\x1b[32m", // Green
            QueueState::Advancing => "\x1b[36m",  // Cyan
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }
}

impl std::fmt::Display for QueueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueueState::Empty => "EMPTY",
            QueueState::Loading => "LOADING",
            QueueState::Presenting => "PRESENTING",
            QueueState::Advancing => "ADVANCING",
        };
        write!(f, "{}", name)
    }
}
