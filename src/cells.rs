use serde_derive::{Deserialize, Serialize};

/// Grid position of a cell. Rows grow northwards, columns grow eastwards.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: u32,
    pub column: u32,
}

impl Coordinate {
    pub fn new(row: u32, column: u32) -> Coordinate {
        Coordinate { row, column }
    }

    /// Creates a new `Coordinate` offset 1 cell away in the given direction.
    /// Returns None if the Coordinate is not representable, the result is not bounds checked
    /// against any particular maze.
    pub fn offset(&self, dir: Direction) -> Option<Coordinate> {
        let (row_delta, column_delta) = dir.delta();
        let row = i64::from(self.row) + row_delta;
        let column = i64::from(self.column) + column_delta;

        if row < 0 || column < 0 || row > i64::from(u32::MAX) || column > i64::from(u32::MAX) {
            None
        } else {
            Some(Coordinate::new(row as u32, column as u32))
        }
    }
}

impl From<(u32, u32)> for Coordinate {
    fn from(row_column_pair: (u32, u32)) -> Coordinate {
        Coordinate::new(row_column_pair.0, row_column_pair.1)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash, Serialize, Deserialize)]
pub enum TopologyKind {
    Rectangular,
    Hexagonal,
    Tunneled,
}

// Slot order for each topology, which is also the clockwise order around a cell.
const RECT_DIRECTIONS: [Direction; 4] =
    [Direction::North, Direction::East, Direction::South, Direction::West];
const HEX_DIRECTIONS: [Direction; 6] = [Direction::NorthEast,
                                        Direction::East,
                                        Direction::SouthEast,
                                        Direction::SouthWest,
                                        Direction::West,
                                        Direction::NorthWest];

impl TopologyKind {
    /// The directions a cell can have neighbours in, in clockwise order.
    /// The position of a direction in this slice is its slot index.
    #[inline]
    pub fn directions(self) -> &'static [Direction] {
        match self {
            TopologyKind::Rectangular | TopologyKind::Tunneled => &RECT_DIRECTIONS,
            TopologyKind::Hexagonal => &HEX_DIRECTIONS,
        }
    }

    #[inline]
    pub fn num_dir(self) -> usize {
        self.directions().len()
    }

    pub fn slot_of(self, dir: Direction) -> Option<usize> {
        self.directions().iter().position(|&d| d == dir)
    }

    /// Slot index facing back the way `slot` points.
    #[inline]
    pub fn opposite_slot(self, slot: usize) -> usize {
        let n = self.num_dir();
        (slot + n / 2) % n
    }

    #[inline]
    pub fn supports_tunnels(self) -> bool {
        self == TopologyKind::Tunneled
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
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
    /// (row, column) step. On hexagonal grids the rows are skewed so that NorthWest
    /// and SouthEast keep the column and the NorthEast/SouthWest axis moves both.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (1, 0),
            Direction::NorthEast => (1, 1),
            Direction::East => (0, 1),
            Direction::SouthEast => (-1, 0),
            Direction::South => (-1, 0),
            Direction::SouthWest => (-1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }
}
