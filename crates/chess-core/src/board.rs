//! The 8x8 board.
//!
//! [`Board`] is a flat, `Copy` array of optional pieces. Copying a board
//! copies every square, so the engine can simulate a move on a copy without
//! touching the original.

use crate::{Color, Coordinate, Direction, Offset, Piece, PieceKind};

/// An 8x8 grid of optional pieces, indexed row-major from a1.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl Board {
    /// Creates a board with no pieces.
    pub const fn empty() -> Self {
        Board {
            squares: [None; 64],
        }
    }

    /// Returns the piece on the given square, if any.
    #[inline]
    pub fn get(&self, coord: Coordinate) -> Option<Piece> {
        self.squares[coord.index()]
    }

    /// Places a piece on (or clears) the given square.
    #[inline]
    pub fn set(&mut self, coord: Coordinate, piece: Option<Piece>) {
        self.squares[coord.index()] = piece;
    }

    /// Moves whatever stands on `from` to `to`, clearing `from`.
    ///
    /// No legality checking happens here. Returns the piece that stood on
    /// `to` before the move.
    pub fn move_piece(&mut self, from: Coordinate, to: Coordinate) -> Option<Piece> {
        let moving = self.squares[from.index()].take();
        std::mem::replace(&mut self.squares[to.index()], moving)
    }

    /// Returns true if the square holds no piece.
    #[inline]
    pub fn is_empty(&self, coord: Coordinate) -> bool {
        self.get(coord).is_none()
    }

    /// Yields the squares reached by stepping from `origin` in `direction`.
    ///
    /// Stops at the board edge or after `max_steps` squares. The origin
    /// itself is never yielded.
    pub fn traverse_direction(
        origin: Coordinate,
        direction: Direction,
        max_steps: Option<usize>,
    ) -> impl Iterator<Item = Coordinate> {
        let step = direction.offset();
        std::iter::successors(origin.offset(step), move |c| c.offset(step))
            .take(max_steps.unwrap_or(usize::MAX))
    }

    /// Yields `origin + offset` for every offset that stays on the board,
    /// in the order given.
    pub fn traverse_offsets(
        origin: Coordinate,
        offsets: &[Offset],
    ) -> impl Iterator<Item = Coordinate> + '_ {
        offsets.iter().filter_map(move |&offset| origin.offset(offset))
    }

    /// Yields every occupied square in row-major order (rank ascending,
    /// then file ascending), optionally restricted to one color.
    pub fn pieces(&self, color: Option<Color>) -> impl Iterator<Item = (Coordinate, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(move |(index, square)| {
                let piece = (*square)?;
                if color.is_some_and(|c| c != piece.color) {
                    return None;
                }
                Coordinate::from_index(index).map(|coord| (coord, piece))
            })
    }

    /// Finds the king of the given color.
    pub fn find_king(&self, color: Color) -> Option<Coordinate> {
        self.pieces(Some(color))
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(coord, _)| coord)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = self
                    .get(Coordinate::at(rank, file))
                    .map_or('.', Piece::to_fen_char);
                write!(f, "{}", c)?;
            }
            if rank > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
