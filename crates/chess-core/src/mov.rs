//! Move representation.

use crate::{Coordinate, PieceKind};
use std::fmt;

/// A chess move: a source and destination square, plus the kind a pawn
/// should become when it reaches the last rank.
///
/// The promotion kind is a hint. It only has an effect when the moving
/// piece is a pawn landing on the promotion rank.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Coordinate,
    pub to: Coordinate,
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// Creates a move without a promotion hint.
    #[inline]
    pub const fn new(from: Coordinate, to: Coordinate) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    /// Returns this move with the given promotion hint.
    #[inline]
    pub const fn with_promotion(self, kind: PieceKind) -> Self {
        Move {
            promotion: Some(kind),
            ..self
        }
    }

    /// Returns true if both moves connect the same two squares.
    #[inline]
    pub fn same_squares(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to
    }

    /// Returns the UCI notation for this move (e.g., "e2e4", "e7e8q").
    pub fn to_uci(self) -> String {
        match self.promotion {
            Some(kind) => format!("{}{}{}", self.from, self.to, kind.to_char()),
            None => format!("{}{}", self.from, self.to),
        }
    }

    /// Parses a move from UCI notation.
    ///
    /// Only knight, bishop, rook and queen are accepted as promotion letters.
    pub fn from_uci(s: &str) -> Option<Self> {
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from = Coordinate::from_algebraic(&s[0..2])?;
        let to = Coordinate::from_algebraic(&s[2..4])?;
        let mv = Move::new(from, to);
        match s[4..].chars().next() {
            None => Some(mv),
            Some(c) => PieceKind::from_char(c)
                .filter(|kind| kind.is_promotion_target())
                .map(|kind| mv.with_promotion(kind)),
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_uci())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}
