//! Compass directions between grid cells.

/// One of the eight grid neighbours.
///
/// The discriminant is the index into a zone's neighbour table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Row above.
    North = 0,
    /// Row above, column right.
    NorthEast = 1,
    /// Column right.
    East = 2,
    /// Row below, column right.
    SouthEast = 3,
    /// Row below.
    South = 4,
    /// Row below, column left.
    SouthWest = 5,
    /// Column left.
    West = 6,
    /// Row above, column left.
    NorthWest = 7,
}

impl Direction {
    /// All eight directions in neighbour-table order.
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

    /// `(d_row, d_col)` grid offset.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (-1, 0),
            Self::NorthEast => (-1, 1),
            Self::East => (0, 1),
            Self::SouthEast => (1, 1),
            Self::South => (1, 0),
            Self::SouthWest => (1, -1),
            Self::West => (0, -1),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Index into a neighbour table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The diagonal combining a vertical and a horizontal direction.
    ///
    /// Returns `None` unless `vertical` is North/South and `horizontal`
    /// is East/West.
    pub fn diagonal(vertical: Direction, horizontal: Direction) -> Option<Direction> {
        match (vertical, horizontal) {
            (Self::North, Self::East) => Some(Self::NorthEast),
            (Self::North, Self::West) => Some(Self::NorthWest),
            (Self::South, Self::East) => Some(Self::SouthEast),
            (Self::South, Self::West) => Some(Self::SouthWest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_index() {
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
        }
    }

    #[test]
    fn diagonal_offsets_sum() {
        let d = Direction::diagonal(Direction::South, Direction::West).unwrap();
        assert_eq!(d.offset(), (1, -1));
        assert!(Direction::diagonal(Direction::East, Direction::West).is_none());
    }
}
