//! Board coordinates and the steps between them.

use std::fmt;

/// A step between two squares, in ranks and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub rank: i8,
    pub file: i8,
}

impl Offset {
    #[inline]
    pub const fn new(rank: i8, file: i8) -> Self {
        Offset { rank, file }
    }
}

/// The eight compass directions, North pointing towards rank 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// All directions, clockwise from North.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Rank and file directions.
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Diagonal directions.
    pub const DIAGONAL: [Direction; 4] = [
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Returns the single-square step for this direction.
    pub const fn offset(self) -> Offset {
        match self {
            Direction::North => Offset::new(1, 0),
            Direction::NorthEast => Offset::new(1, 1),
            Direction::East => Offset::new(0, 1),
            Direction::SouthEast => Offset::new(-1, 1),
            Direction::South => Offset::new(-1, 0),
            Direction::SouthWest => Offset::new(-1, -1),
            Direction::West => Offset::new(0, -1),
            Direction::NorthWest => Offset::new(1, -1),
        }
    }
}

/// A square on the chess board, addressed by 0-based rank and file.
///
/// Rank 0 is White's back rank, file 0 is the a-file. A `Coordinate` is
/// always on the board; constructors return `None` otherwise.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    rank: u8,
    file: u8,
}

impl Coordinate {
    /// Creates a coordinate, or `None` if either component is above 7.
    #[inline]
    pub const fn new(rank: u8, file: u8) -> Option<Self> {
        if rank < 8 && file < 8 {
            Some(Coordinate { rank, file })
        } else {
            None
        }
    }

    /// Creates a coordinate known to be on the board.
    ///
    /// # Panics
    ///
    /// Panics if `rank` or `file` is above 7.
    #[inline]
    pub const fn at(rank: u8, file: u8) -> Self {
        assert!(rank < 8 && file < 8, "coordinate off the board");
        Coordinate { rank, file }
    }

    /// Creates a coordinate from signed components, as received from clients.
    pub fn from_signed(rank: i64, file: i64) -> Option<Self> {
        let rank = u8::try_from(rank).ok()?;
        let file = u8::try_from(file).ok()?;
        Self::new(rank, file)
    }

    /// Creates a coordinate from a row-major index (0-63).
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 64 {
            Some(Coordinate {
                rank: (index / 8) as u8,
                file: (index % 8) as u8,
            })
        } else {
            None
        }
    }

    /// Parses a square from algebraic notation (e.g., "e4").
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank)
        {
            return None;
        }
        Self::new(rank as u8 - b'1', file as u8 - b'a')
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.file
    }

    /// Returns the row-major index (rank * 8 + file).
    #[inline]
    pub const fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    /// Adds an offset, returning `None` if the result leaves the board.
    #[inline]
    pub fn offset(self, offset: Offset) -> Option<Self> {
        let rank = i16::from(self.rank) + i16::from(offset.rank);
        let file = i16::from(self.file) + i16::from(offset.file);
        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Some(Coordinate {
                rank: rank as u8,
                file: file as u8,
            })
        } else {
            None
        }
    }

    /// Returns the algebraic notation for this square.
    pub fn to_algebraic(self) -> String {
        format!("{}{}", (b'a' + self.file) as char, (b'1' + self.rank) as char)
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({})", self.to_algebraic())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_new() {
        let e4 = Coordinate::new(3, 4).unwrap();
        assert_eq!(e4.rank(), 3);
        assert_eq!(e4.file(), 4);
        assert_eq!(e4.index(), 28);
        assert_eq!(Coordinate::new(8, 0), None);
        assert_eq!(Coordinate::new(0, 8), None);
    }

    #[test]
    fn coordinate_from_signed() {
        assert_eq!(Coordinate::from_signed(7, 7), Coordinate::new(7, 7));
        assert_eq!(Coordinate::from_signed(-1, 0), None);
        assert_eq!(Coordinate::from_signed(0, 8), None);
        assert_eq!(Coordinate::from_signed(300, 0), None);
    }

    #[test]
    fn coordinate_from_algebraic() {
        assert_eq!(Coordinate::from_algebraic("a1"), Coordinate::new(0, 0));
        assert_eq!(Coordinate::from_algebraic("e4"), Coordinate::new(3, 4));
        assert_eq!(Coordinate::from_algebraic("h8"), Coordinate::new(7, 7));
        assert_eq!(Coordinate::from_algebraic("i1"), None);
        assert_eq!(Coordinate::from_algebraic("a9"), None);
        assert_eq!(Coordinate::from_algebraic("a0"), None);
        assert_eq!(Coordinate::from_algebraic("e44"), None);
        assert_eq!(Coordinate::from_algebraic(""), None);
    }

    #[test]
    fn coordinate_to_algebraic() {
        assert_eq!(Coordinate::at(0, 0).to_algebraic(), "a1");
        assert_eq!(Coordinate::at(7, 7).to_algebraic(), "h8");
        assert_eq!(Coordinate::at(3, 4).to_string(), "e4");
        assert_eq!(format!("{:?}", Coordinate::at(2, 4)), "Coordinate(e3)");
    }

    #[test]
    fn coordinate_offset() {
        let b1 = Coordinate::at(0, 1);
        assert_eq!(b1.offset(Offset::new(2, 1)), Coordinate::new(2, 2));
        assert_eq!(b1.offset(Offset::new(-1, 0)), None);
        assert_eq!(b1.offset(Offset::new(0, -2)), None);
        assert_eq!(
            Coordinate::at(7, 7).offset(Direction::NorthEast.offset()),
            None
        );
    }

    #[test]
    fn index_roundtrip() {
        for index in 0..64 {
            assert_eq!(Coordinate::from_index(index).unwrap().index(), index);
        }
        assert_eq!(Coordinate::from_index(64), None);
    }

    #[test]
    fn direction_sets() {
        for dir in Direction::ORTHOGONAL {
            let o = dir.offset();
            assert!(o.rank == 0 || o.file == 0);
        }
        for dir in Direction::DIAGONAL {
            let o = dir.offset();
            assert!(o.rank != 0 && o.file != 0);
        }
    }
}
