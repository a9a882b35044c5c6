//! Pseudo-legal destination generation, keyed by piece kind.

use chess_core::{Board, Color, Coordinate, Direction, Offset, Piece, PieceKind};

/// Knight jumps, clockwise from north-north-east.
pub const KNIGHT_OFFSETS: [Offset; 8] = [
    Offset::new(2, 1),
    Offset::new(1, 2),
    Offset::new(-1, 2),
    Offset::new(-2, 1),
    Offset::new(-2, -1),
    Offset::new(-1, -2),
    Offset::new(1, -2),
    Offset::new(2, -1),
];

/// Single king steps, clockwise from north.
pub const KING_OFFSETS: [Offset; 8] = [
    Direction::North.offset(),
    Direction::NorthEast.offset(),
    Direction::East.offset(),
    Direction::SouthEast.offset(),
    Direction::South.offset(),
    Direction::SouthWest.offset(),
    Direction::West.offset(),
    Direction::NorthWest.offset(),
];

/// How a piece kind moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementRule {
    /// Rays in each direction until blocked.
    Sliding(&'static [Direction]),
    /// A fixed set of jumps.
    Offsets(&'static [Offset]),
    /// Forward pushes, diagonal captures and en passant.
    Pawn,
}

/// Returns the movement rule for a piece kind.
pub const fn movement_rule(kind: PieceKind) -> MovementRule {
    match kind {
        PieceKind::Pawn => MovementRule::Pawn,
        PieceKind::Knight => MovementRule::Offsets(&KNIGHT_OFFSETS),
        PieceKind::Bishop => MovementRule::Sliding(&Direction::DIAGONAL),
        PieceKind::Rook => MovementRule::Sliding(&Direction::ORTHOGONAL),
        PieceKind::Queen => MovementRule::Sliding(&Direction::ALL),
        PieceKind::King => MovementRule::Offsets(&KING_OFFSETS),
    }
}

/// Returns every square `piece` standing on `from` could move to, ignoring
/// whether the move would leave its own king in check.
///
/// Castling is not included; it depends on attack information and is
/// generated alongside the legality filter.
pub fn pseudo_legal_destinations(
    board: &Board,
    from: Coordinate,
    piece: Piece,
    en_passant: Option<Coordinate>,
) -> Vec<Coordinate> {
    match movement_rule(piece.kind) {
        MovementRule::Sliding(directions) => sliding(board, from, piece.color, directions),
        MovementRule::Offsets(offsets) => jumps(board, from, piece.color, offsets),
        MovementRule::Pawn => pawn(board, from, piece.color, en_passant),
    }
}

fn is_enemy(board: &Board, coord: Coordinate, color: Color) -> bool {
    board.get(coord).is_some_and(|p| p.color != color)
}

fn sliding(board: &Board, from: Coordinate, color: Color, directions: &[Direction]) -> Vec<Coordinate> {
    let mut targets = Vec::new();
    for &direction in directions {
        for to in Board::traverse_direction(from, direction, None) {
            match board.get(to) {
                None => targets.push(to),
                Some(blocker) => {
                    if blocker.color != color {
                        targets.push(to);
                    }
                    break;
                }
            }
        }
    }
    targets
}

fn jumps(board: &Board, from: Coordinate, color: Color, offsets: &[Offset]) -> Vec<Coordinate> {
    Board::traverse_offsets(from, offsets)
        .filter(|&to| board.get(to).map_or(true, |p| p.color != color))
        .collect()
}

fn pawn(
    board: &Board,
    from: Coordinate,
    color: Color,
    en_passant: Option<Coordinate>,
) -> Vec<Coordinate> {
    let forward = match color {
        Color::White => Direction::North,
        Color::Black => Direction::South,
    };
    let max_steps = if from.rank() == color.pawn_rank() { 2 } else { 1 };

    let mut targets: Vec<Coordinate> = Board::traverse_direction(from, forward, Some(max_steps))
        .take_while(|&to| board.is_empty(to))
        .collect();

    let dir = color.pawn_direction();
    let captures = [Offset::new(dir, -1), Offset::new(dir, 1)];
    targets.extend(
        Board::traverse_offsets(from, &captures)
            .filter(|&to| is_enemy(board, to, color) || en_passant == Some(to)),
    );
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Coordinate {
        Coordinate::from_algebraic(name).unwrap()
    }

    fn place(board: &mut Board, name: &str, color: Color, kind: PieceKind) {
        board.set(sq(name), Some(Piece::new(color, kind)));
    }

    fn sorted(mut squares: Vec<Coordinate>) -> Vec<String> {
        squares.sort();
        squares.into_iter().map(Coordinate::to_algebraic).collect()
    }

    fn destinations(board: &Board, from: &str, ep: Option<&str>) -> Vec<String> {
        let piece = board.get(sq(from)).unwrap();
        sorted(pseudo_legal_destinations(board, sq(from), piece, ep.map(sq)))
    }

    #[test]
    fn rule_table() {
        assert_eq!(movement_rule(PieceKind::Pawn), MovementRule::Pawn);
        assert!(matches!(movement_rule(PieceKind::Knight), MovementRule::Offsets(o) if o.len() == 8));
        assert!(matches!(movement_rule(PieceKind::Queen), MovementRule::Sliding(d) if d.len() == 8));
        assert!(matches!(movement_rule(PieceKind::Rook), MovementRule::Sliding(d) if d.len() == 4));
    }

    #[test]
    fn rook_stops_before_friend_and_on_enemy() {
        let mut board = Board::empty();
        place(&mut board, "a1", Color::White, PieceKind::Rook);
        place(&mut board, "a4", Color::White, PieceKind::Pawn);
        place(&mut board, "c1", Color::Black, PieceKind::Knight);
        assert_eq!(destinations(&board, "a1", None), ["b1", "c1", "a2", "a3"]);
    }

    #[test]
    fn bishop_in_corner() {
        let mut board = Board::empty();
        place(&mut board, "h8", Color::Black, PieceKind::Bishop);
        assert_eq!(destinations(&board, "h8", None).len(), 7);
    }

    #[test]
    fn queen_in_center_of_empty_board() {
        let mut board = Board::empty();
        place(&mut board, "d4", Color::White, PieceKind::Queen);
        assert_eq!(destinations(&board, "d4", None).len(), 27);
    }

    #[test]
    fn knight_skips_friendly_squares() {
        let mut board = Board::empty();
        place(&mut board, "b1", Color::White, PieceKind::Knight);
        place(&mut board, "d2", Color::White, PieceKind::Pawn);
        place(&mut board, "c3", Color::Black, PieceKind::Pawn);
        assert_eq!(destinations(&board, "b1", None), ["a3", "c3"]);
    }

    #[test]
    fn king_steps() {
        let mut board = Board::empty();
        place(&mut board, "e1", Color::White, PieceKind::King);
        assert_eq!(destinations(&board, "e1", None), ["d1", "f1", "d2", "e2", "f2"]);
    }

    #[test]
    fn pawn_double_push_from_start() {
        let mut board = Board::empty();
        place(&mut board, "e2", Color::White, PieceKind::Pawn);
        assert_eq!(destinations(&board, "e2", None), ["e3", "e4"]);

        place(&mut board, "e7", Color::Black, PieceKind::Pawn);
        assert_eq!(destinations(&board, "e7", None), ["e5", "e6"]);
    }

    #[test]
    fn pawn_single_push_after_start() {
        let mut board = Board::empty();
        place(&mut board, "e3", Color::White, PieceKind::Pawn);
        assert_eq!(destinations(&board, "e3", None), ["e4"]);
    }

    #[test]
    fn pawn_never_captures_forward() {
        let mut board = Board::empty();
        place(&mut board, "e2", Color::White, PieceKind::Pawn);
        place(&mut board, "e4", Color::Black, PieceKind::Pawn);
        assert_eq!(destinations(&board, "e2", None), ["e3"]);

        place(&mut board, "e3", Color::Black, PieceKind::Knight);
        assert!(destinations(&board, "e2", None).is_empty());
    }

    #[test]
    fn pawn_captures_diagonally() {
        let mut board = Board::empty();
        place(&mut board, "d4", Color::White, PieceKind::Pawn);
        place(&mut board, "c5", Color::Black, PieceKind::Pawn);
        place(&mut board, "e5", Color::White, PieceKind::Pawn);
        assert_eq!(destinations(&board, "d4", None), ["c5", "d5"]);
    }

    #[test]
    fn pawn_en_passant_target() {
        let mut board = Board::empty();
        place(&mut board, "e5", Color::White, PieceKind::Pawn);
        place(&mut board, "d5", Color::Black, PieceKind::Pawn);
        assert_eq!(destinations(&board, "e5", Some("d6")), ["d6", "e6"]);
    }

    #[test]
    fn pawn_on_edge_file() {
        let mut board = Board::empty();
        place(&mut board, "a7", Color::Black, PieceKind::Pawn);
        place(&mut board, "b6", Color::White, PieceKind::Rook);
        assert_eq!(destinations(&board, "a7", None), ["a5", "a6", "b6"]);
    }
}
