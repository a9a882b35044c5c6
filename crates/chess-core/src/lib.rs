//! Core types for chess.
//!
//! This crate provides the fundamental types used across the engine and server:
//! - [`Piece`], [`PieceKind`] and [`Color`] for piece representation
//! - [`Coordinate`], [`Direction`] and [`Offset`] for board geometry
//! - [`Board`], the 8x8 grid with ray and offset traversal
//! - [`Move`] for move representation
//! - FEN parsing and validation

mod board;
mod color;
mod coordinate;
mod fen;
mod mov;
mod piece;

pub use board::Board;
pub use color::Color;
pub use coordinate::{Coordinate, Direction, Offset};
pub use fen::{FenError, FenParser};
pub use mov::Move;
pub use piece::{Piece, PieceKind};
