//! Game state: a position, its legal moves and its result.
//!
//! [`Game`] is the authority over one chess game. It validates every move
//! against the legal set of the current position, applies it, and checks
//! for checkmate, stalemate and the fifty-move rule straight after.

use crate::movegen::{generate_moves, is_promoting, make_move};
use crate::rules::{EndReason, GameResult};
use crate::Position;
use chess_core::{Color, Coordinate, FenError, Move, PieceKind};
use std::cell::OnceCell;
use thiserror::Error;

/// Why a move was rejected. The game is left unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// A coordinate component is outside 0..8.
    #[error("square ({rank}, {file}) is off the board")]
    OffBoard { rank: i64, file: i64 },

    /// The source and destination pair is not in the legal set.
    #[error("illegal move: {0}")]
    Illegal(Move),

    /// A pawn may only promote to a knight, bishop, rook or queen.
    #[error("cannot promote to {0}")]
    InvalidPromotion(PieceKind),

    /// The move text could not be parsed.
    #[error("invalid move notation: {0}")]
    Notation(String),

    /// The game already has a result.
    #[error("game has already ended")]
    GameOver,
}

/// Builds a coordinate from untrusted components.
pub fn checked_coordinate(rank: i64, file: i64) -> Result<Coordinate, MoveError> {
    Coordinate::from_signed(rank, file).ok_or(MoveError::OffBoard { rank, file })
}

/// A chess game from a given position to its result.
#[derive(Debug, Clone)]
pub struct Game {
    /// Current position.
    position: Position,
    /// Legal moves for `position`, computed on first use.
    legal_moves: OnceCell<Vec<Move>>,
    /// Game result if the game has ended.
    result: Option<GameResult>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a new game with the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    /// Creates a game from a custom starting position.
    ///
    /// The position is checked for a result straight away, so a game built
    /// from a mated position is already over.
    pub fn from_position(position: Position) -> Self {
        let mut game = Game {
            position,
            legal_moves: OnceCell::new(),
            result: None,
        };
        game.result = game.detect_result();
        game
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Position::from_fen(fen).map(Self::from_position)
    }

    /// Returns a reference to the current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Returns the side to move.
    pub fn active_color(&self) -> Color {
        self.position.active_color
    }

    /// Returns all legal moves in the current position.
    ///
    /// Promoting moves appear once, without a promotion kind.
    pub fn legal_moves(&self) -> &[Move] {
        self.legal_moves.get_or_init(|| generate_moves(&self.position))
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.position.is_in_check()
    }

    /// Returns the game result if the game is over.
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Returns true while the game has no result.
    pub fn is_ongoing(&self) -> bool {
        self.result.is_none()
    }

    /// Returns true if `m` would promote a pawn.
    pub fn is_promotion(&self, m: Move) -> bool {
        is_promoting(&self.position.board, m)
    }

    /// Makes a move and returns the result it produced, if any.
    ///
    /// The move is matched against the legal set by its squares. Its
    /// promotion kind is used only when the move promotes a pawn; without
    /// one the pawn stays a pawn.
    pub fn make_move(&mut self, m: Move) -> Result<Option<GameResult>, MoveError> {
        if self.result.is_some() {
            return Err(MoveError::GameOver);
        }

        let legal = self
            .legal_moves()
            .iter()
            .find(|lm| lm.same_squares(&m))
            .copied()
            .ok_or(MoveError::Illegal(m))?;

        let applied = match m.promotion {
            Some(kind) if self.is_promotion(legal) => {
                if !kind.is_promotion_target() {
                    return Err(MoveError::InvalidPromotion(kind));
                }
                legal.with_promotion(kind)
            }
            _ => legal,
        };

        self.position = make_move(&self.position, applied);
        self.legal_moves = OnceCell::new();
        self.result = self.detect_result();
        Ok(self.result)
    }

    /// Makes a move given in UCI notation.
    pub fn make_move_uci(&mut self, uci: &str) -> Result<Option<GameResult>, MoveError> {
        let m = Move::from_uci(uci).ok_or_else(|| MoveError::Notation(uci.to_string()))?;
        self.make_move(m)
    }

    /// Ends the game from outside the board: resignation, timeout or
    /// abandonment. Does nothing if the game already has a result.
    ///
    /// Returns true if `result` was recorded.
    pub fn conclude(&mut self, result: GameResult) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(result);
        true
    }

    /// Converts the current position to a FEN string.
    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    fn detect_result(&self) -> Option<GameResult> {
        if self.legal_moves().is_empty() {
            let mover = self.position.active_color.opposite();
            return Some(if self.is_check() {
                GameResult::win(mover, EndReason::Checkmate)
            } else {
                GameResult::draw(EndReason::Stalemate)
            });
        }

        if self.position.halfmove_clock >= 100 {
            return Some(GameResult::draw(EndReason::FiftyMoveRule));
        }

        None
    }
}
