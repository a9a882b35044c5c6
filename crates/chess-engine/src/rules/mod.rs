//! Game outcomes and piece movement rules.
//!
//! Movement is data-driven: [`movement_rule`] maps each [`PieceKind`] to a
//! [`MovementRule`], and one pure generator per rule family produces the
//! pseudo-legal destinations.
//!
//! [`PieceKind`]: chess_core::PieceKind

mod movement;

pub use movement::{
    movement_rule, pseudo_legal_destinations, MovementRule, KING_OFFSETS, KNIGHT_OFFSETS,
};

use chess_core::Color;
use std::fmt;

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndReason {
    /// The side to move is in check and has no legal moves.
    Checkmate,
    /// The side to move is not in check and has no legal moves.
    Stalemate,
    /// 100 half-moves without a pawn move or capture.
    FiftyMoveRule,
    /// A player left a game in progress.
    Abandoned,
    /// A player's clock ran out.
    Timeout,
    /// A player resigned.
    Resigned,
}

impl EndReason {
    pub const ALL: [EndReason; 6] = [
        EndReason::Checkmate,
        EndReason::Stalemate,
        EndReason::FiftyMoveRule,
        EndReason::Abandoned,
        EndReason::Timeout,
        EndReason::Resigned,
    ];

    /// Parses a name produced by [`EndReason::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.as_str() == name)
    }

    /// Returns the upper snake case name used on the wire and in storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            EndReason::Checkmate => "CHECKMATE",
            EndReason::Stalemate => "STALEMATE",
            EndReason::FiftyMoveRule => "FIFTY_MOVE_RULE",
            EndReason::Abandoned => "ABANDONED",
            EndReason::Timeout => "TIMEOUT",
            EndReason::Resigned => "RESIGNED",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EndReason::Checkmate => "checkmate",
            EndReason::Stalemate => "stalemate",
            EndReason::FiftyMoveRule => "the fifty-move rule",
            EndReason::Abandoned => "abandonment",
            EndReason::Timeout => "timeout",
            EndReason::Resigned => "resignation",
        };
        write!(f, "{}", text)
    }
}

/// Result of a finished game. A `winner` of `None` is a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameResult {
    pub winner: Option<Color>,
    pub reason: EndReason,
}

impl GameResult {
    /// A decisive result.
    pub const fn win(winner: Color, reason: EndReason) -> Self {
        GameResult {
            winner: Some(winner),
            reason,
        }
    }

    /// A drawn result.
    pub const fn draw(reason: EndReason) -> Self {
        GameResult {
            winner: None,
            reason,
        }
    }

    #[inline]
    pub const fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner {
            Some(color) => write!(f, "{} wins by {}", color, self.reason),
            None => write!(f, "Draw by {}", self.reason),
        }
    }
}
