//! Chess rules engine on top of a value-type board.
//!
//! This crate provides:
//! - [`rules`] - piece movement rules and game results
//! - [`Position`] - full position state including castling rights and counters
//! - [`movegen`] - legal move generation, move application and perft
//! - [`Game`] - a position with cached legal moves and result detection
//!
//! # Architecture
//!
//! Every piece kind maps to a [`MovementRule`]; one pure generator per rule
//! family yields pseudo-legal destinations. Legality is decided by playing
//! each candidate on a copy of the position and testing whether the mover's
//! king is attacked. [`Position`] is `Copy`, so this never disturbs the
//! position being searched.
//!
//! # Example
//!
//! ```
//! use chess_engine::{EndReason, Game};
//!
//! let mut game = Game::new();
//! println!("Legal moves from starting position: {}", game.legal_moves().len());
//!
//! for m in ["f2f3", "e7e5", "g2g4", "d8h4"] {
//!     game.make_move_uci(m).unwrap();
//! }
//! assert_eq!(game.result().map(|r| r.reason), Some(EndReason::Checkmate));
//! ```

mod game;
pub mod movegen;
mod position;
pub mod rules;

pub use game::{checked_coordinate, Game, MoveError};
pub use movegen::perft::perft;
pub use movegen::{generate_moves, is_king_attacked, is_square_attacked, make_move};
pub use position::{CastlingRights, Position};
pub use rules::{movement_rule, EndReason, GameResult, MovementRule};
