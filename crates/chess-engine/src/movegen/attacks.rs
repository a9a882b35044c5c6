//! Attack detection by reverse lookup.
//!
//! Instead of generating every enemy move, each test walks outward from the
//! target square using the attacker's own movement pattern and checks what
//! it finds there.

use crate::rules::{KING_OFFSETS, KNIGHT_OFFSETS};
use chess_core::{Board, Color, Coordinate, Direction, Offset, Piece, PieceKind};

/// Returns true if a piece of `kind` and `color` stands on `coord`.
#[inline]
fn holds(board: &Board, coord: Coordinate, color: Color, kind: PieceKind) -> bool {
    board.get(coord) == Some(Piece::new(color, kind))
}

/// Returns the first piece met when walking from `origin` in `direction`.
fn first_piece(board: &Board, origin: Coordinate, direction: Direction) -> Option<Piece> {
    Board::traverse_direction(origin, direction, None).find_map(|c| board.get(c))
}

/// Returns true if a pawn of `by` attacks `sq`.
pub fn pawn_attacks_square(board: &Board, sq: Coordinate, by: Color) -> bool {
    // An attacking pawn sits one step behind the square from its own view
    let back = -by.pawn_direction();
    let sources = [Offset::new(back, -1), Offset::new(back, 1)];
    let attacked =
        Board::traverse_offsets(sq, &sources).any(|c| holds(board, c, by, PieceKind::Pawn));
    attacked
}

/// Returns true if a knight of `by` attacks `sq`.
pub fn knight_attacks_square(board: &Board, sq: Coordinate, by: Color) -> bool {
    Board::traverse_offsets(sq, &KNIGHT_OFFSETS).any(|c| holds(board, c, by, PieceKind::Knight))
}

/// Returns true if the king of `by` attacks `sq`.
pub fn king_attacks_square(board: &Board, sq: Coordinate, by: Color) -> bool {
    Board::traverse_offsets(sq, &KING_OFFSETS).any(|c| holds(board, c, by, PieceKind::King))
}

/// Returns true if a bishop, rook or queen of `by` attacks `sq`.
pub fn slider_attacks_square(board: &Board, sq: Coordinate, by: Color) -> bool {
    let hits = |directions: &[Direction], kind: PieceKind| {
        directions.iter().any(|&d| {
            first_piece(board, sq, d)
                .is_some_and(|p| p.color == by && (p.kind == kind || p.kind == PieceKind::Queen))
        })
    };
    hits(&Direction::ORTHOGONAL, PieceKind::Rook) || hits(&Direction::DIAGONAL, PieceKind::Bishop)
}

/// Returns true if any piece of `by` attacks `sq`.
pub fn is_square_attacked(board: &Board, sq: Coordinate, by: Color) -> bool {
    pawn_attacks_square(board, sq, by)
        || knight_attacks_square(board, sq, by)
        || king_attacks_square(board, sq, by)
        || slider_attacks_square(board, sq, by)
}
