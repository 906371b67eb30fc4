//! Player identity, clock, and per-game statistics.
//!
//! The engine never reads wall time: clocks only change through the
//! explicit `add_time`/`subtract_time` calls made by the hosting
//! application, which also decides when a flag fall becomes a timeout.

use std::time::Duration;

use crate::engine::types::{Color, Piece};

/// Default clock budget when no time control is configured.
const DEFAULT_TIME: Duration = Duration::from_secs(30 * 60);

/// One side of a game: identity, remaining time, and statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub color: Color,
    pub is_human: bool,

    /// Remaining time on this player's clock.
    time_left: Duration,

    /// Moves this player has made in the current game.
    pub moves_played: u32,

    /// Enemy pieces this player has captured, in capture order.
    pub captured_pieces: Vec<Piece>,

    /// Number of times this player has put the opponent in check.
    pub checks_given: u32,

    /// Whether this player's king is currently in check.
    pub in_check: bool,
}

impl Player {
    /// A human player with the default 30-minute clock.
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Player {
            name: name.into(),
            color,
            is_human: true,
            time_left: DEFAULT_TIME,
            moves_played: 0,
            captured_pieces: Vec::new(),
            checks_given: 0,
            in_check: false,
        }
    }

    /// A non-human player (external engine, scripted opponent).
    pub fn new_engine(name: impl Into<String>, color: Color) -> Self {
        Player {
            is_human: false,
            ..Player::new(name, color)
        }
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    #[inline]
    pub fn time_left(&self) -> Duration {
        self.time_left
    }

    pub fn set_time_left(&mut self, time: Duration) {
        self.time_left = time;
    }

    /// Credit time (increments, delay compensation).
    pub fn add_time(&mut self, amount: Duration) {
        self.time_left += amount;
    }

    /// Charge elapsed thinking time. Saturates at zero rather than
    /// underflowing; the caller checks `has_time_left` afterwards.
    pub fn subtract_time(&mut self, amount: Duration) {
        self.time_left = self.time_left.saturating_sub(amount);
    }

    #[inline]
    pub fn has_time_left(&self) -> bool {
        !self.time_left.is_zero()
    }

    /// Clock display as "MM:SS" (minutes unbounded).
    pub fn formatted_time(&self) -> String {
        let total = self.time_left.as_secs();
        format!("{:02}:{:02}", total / 60, total % 60)
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// One-line statistics summary for display.
    pub fn statistics(&self) -> String {
        format!(
            "{} ({}): {} moves, {} captures, {} checks given",
            self.name,
            self.color,
            self.moves_played,
            self.captured_pieces.len(),
            self.checks_given
        )
    }

    /// Clear all per-game counters (new game, same player).
    pub fn reset_statistics(&mut self) {
        self.moves_played = 0;
        self.captured_pieces.clear();
        self.checks_given = 0;
        self.in_check = false;
    }

    pub(crate) fn record_move(&mut self) {
        self.moves_played += 1;
    }

    pub(crate) fn record_capture(&mut self, piece: Piece) {
        self.captured_pieces.push(piece);
    }

    pub(crate) fn record_check_given(&mut self) {
        self.checks_given += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
