//! Move generation.
//!
//! Legal moves are produced in two steps: the movement rules yield
//! pseudo-legal destinations for every piece of the side to move, then each
//! candidate is played on a copy of the position and dropped if it leaves the
//! mover's king attacked. That copy-and-check step is the only pin and check
//! handling. Castling is generated separately because it needs attack
//! information along the king's path.

mod attacks;
pub mod perft;

use crate::rules::pseudo_legal_destinations;
use crate::Position;
use chess_core::{Board, Color, Coordinate, Move, Piece, PieceKind};

pub use attacks::{
    is_square_attacked, king_attacks_square, knight_attacks_square, pawn_attacks_square,
    slider_attacks_square,
};

/// King file at the start of the game.
const KING_HOME_FILE: u8 = 4;

/// Files involved in castling on one side of the board.
struct CastleSide {
    rook_file: u8,
    king_to_file: u8,
    rook_to_file: u8,
}

const KINGSIDE: CastleSide = CastleSide {
    rook_file: 7,
    king_to_file: 6,
    rook_to_file: 5,
};

const QUEENSIDE: CastleSide = CastleSide {
    rook_file: 0,
    king_to_file: 2,
    rook_to_file: 3,
};

/// Generates all legal moves for the given position.
///
/// Moves carry no promotion kind; a pawn reaching the last rank appears
/// once per destination. See [`perft::expand_promotions`] for the
/// per-kind expansion.
pub fn generate_moves(position: &Position) -> Vec<Move> {
    let us = position.active_color;
    let mut moves = Vec::new();

    for (from, piece) in position.board.pieces(Some(us)) {
        for to in pseudo_legal_destinations(&position.board, from, piece, position.en_passant) {
            let m = Move::new(from, to);
            if !is_king_attacked(&make_move(position, m), us) {
                moves.push(m);
            }
        }
    }

    generate_castling_moves(position, &mut moves);
    moves
}

/// Generates castling moves if legal.
fn generate_castling_moves(position: &Position, moves: &mut Vec<Move>) {
    let us = position.active_color;
    let rank = us.back_rank();
    let king_from = Coordinate::at(rank, KING_HOME_FILE);

    if position.board.get(king_from) != Some(Piece::new(us, PieceKind::King)) {
        return;
    }

    // Can't castle out of check
    if is_king_attacked(position, us) {
        return;
    }

    let sides = [
        (position.castling.can_castle_kingside(us), KINGSIDE),
        (position.castling.can_castle_queenside(us), QUEENSIDE),
    ];
    for (allowed, side) in sides {
        if allowed && can_castle(&position.board, us, &side) {
            moves.push(Move::new(king_from, Coordinate::at(rank, side.king_to_file)));
        }
    }
}

fn can_castle(board: &Board, us: Color, side: &CastleSide) -> bool {
    let rank = us.back_rank();
    let rook_home = Coordinate::at(rank, side.rook_file);
    if board.get(rook_home) != Some(Piece::new(us, PieceKind::Rook)) {
        return false;
    }

    let (lo, hi) = if side.rook_file < KING_HOME_FILE {
        (side.rook_file + 1, KING_HOME_FILE)
    } else {
        (KING_HOME_FILE + 1, side.rook_file)
    };
    if !(lo..hi).all(|file| board.is_empty(Coordinate::at(rank, file))) {
        return false;
    }

    // The squares the king crosses, destination included
    let (lo, hi) = if side.king_to_file < KING_HOME_FILE {
        (side.king_to_file, KING_HOME_FILE)
    } else {
        (KING_HOME_FILE + 1, side.king_to_file + 1)
    };
    (lo..hi).all(|file| !is_square_attacked(board, Coordinate::at(rank, file), us.opposite()))
}

/// Returns true if the king of the given color is in check.
///
/// # Panics
///
/// Panics if that king is not on the board.
pub fn is_king_attacked(position: &Position, king_color: Color) -> bool {
    let king = position.king_square(king_color);
    is_square_attacked(&position.board, king, king_color.opposite())
}

/// Returns true if `m` moves a pawn onto its promotion rank.
pub fn is_promoting(board: &Board, m: Move) -> bool {
    board.get(m.from).is_some_and(|piece| {
        piece.kind == PieceKind::Pawn && m.to.rank() == piece.color.promotion_rank()
    })
}

/// Makes a move and returns the new position.
///
/// The move must already be legal. A promotion kind is applied only when a
/// pawn lands on its last rank and the kind is a valid promotion target;
/// otherwise the pawn stays a pawn.
pub fn make_move(position: &Position, m: Move) -> Position {
    let mut next = *position;
    let us = position.active_color;
    let piece = position
        .board
        .get(m.from)
        .expect("make_move called with an empty source square");

    let captured = next.board.move_piece(m.from, m.to);
    let mut is_capture = captured.is_some();

    // A capture on a rook's home square revokes the matching right
    if captured.is_some() {
        next.castling.remove_for_rook_square(m.to);
    }

    next.en_passant = None;
    match piece.kind {
        PieceKind::King => {
            next.castling.remove_color(us);
            let side = match m.to.file() as i8 - m.from.file() as i8 {
                2 => Some(KINGSIDE),
                -2 => Some(QUEENSIDE),
                _ => None,
            };
            if let Some(side) = side {
                let rank = m.from.rank();
                next.board.move_piece(
                    Coordinate::at(rank, side.rook_file),
                    Coordinate::at(rank, side.rook_to_file),
                );
            }
        }
        PieceKind::Rook => next.castling.remove_for_rook_square(m.from),
        PieceKind::Pawn => {
            if position.en_passant == Some(m.to) {
                // The captured pawn stands beside the mover, not on the target
                next.board.set(Coordinate::at(m.from.rank(), m.to.file()), None);
                is_capture = true;
            } else if m.from.rank().abs_diff(m.to.rank()) == 2 {
                next.en_passant = Coordinate::new((m.from.rank() + m.to.rank()) / 2, m.from.file());
            }

            if m.to.rank() == us.promotion_rank() {
                if let Some(kind) = m.promotion.filter(|kind| kind.is_promotion_target()) {
                    next.board.set(m.to, Some(Piece::new(us, kind)));
                }
            }
        }
        _ => {}
    }

    if piece.kind == PieceKind::Pawn || is_capture {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock += 1;
    }

    if us == Color::Black {
        next.fullmove_number += 1;
    }

    next.active_color = us.opposite();
    next
}
