use std::ops::Range;

use crate::cells::{Coordinate, TopologyKind};
use crate::errors::*;
use crate::units::{ColumnsCount, EdgesCount, NodesCount, RowsCount};

/// Bounds rules of a maze topology.
///
/// Every row holds `columns` cells. On a hexagonal grid row `r` starts at column `(r + 1) / 2`,
/// which shapes the valid coordinates into a parallelogram.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridDimensions {
    kind: TopologyKind,
    rows: RowsCount,
    columns: ColumnsCount,
    edges: EdgesCount,
}

impl GridDimensions {
    pub fn new(kind: TopologyKind, rows: RowsCount, columns: ColumnsCount) -> Result<GridDimensions> {
        let (RowsCount(r), ColumnsCount(c)) = (rows, columns);

        // The skewed hex columns must stay representable as u32 too.
        let max_column = c.checked_add(r / 2 + 1);
        let representable = r <= u32::MAX as usize &&
                            max_column.map_or(false, |m| m <= u32::MAX as usize) &&
                            r.checked_mul(c).is_some();

        let edges = if r == 0 || c == 0 || !representable {
            None
        } else {
            edges_count(kind, r, c)
        };
        match edges {
            Some(edges) => Ok(GridDimensions { kind, rows, columns, edges: EdgesCount(edges) }),
            None => bail!(ErrorKind::InvalidDimensions(r, c)),
        }
    }

    #[inline(always)]
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    #[inline(always)]
    pub fn rows(&self) -> RowsCount {
        self.rows
    }

    #[inline(always)]
    pub fn columns(&self) -> ColumnsCount {
        self.columns
    }

    #[inline(always)]
    pub fn size(&self) -> NodesCount {
        NodesCount(self.rows.0 * self.columns.0)
    }

    /// The first valid column of a row.
    #[inline]
    pub fn first_column(&self, row: u32) -> u32 {
        match self.kind {
            TopologyKind::Hexagonal => (row + 1) / 2,
            TopologyKind::Rectangular | TopologyKind::Tunneled => 0,
        }
    }

    /// The valid columns of a row, regardless of whether the row itself is valid.
    #[inline]
    pub fn column_span(&self, row: u32) -> Range<u32> {
        let first = self.first_column(row);
        first..(first + self.columns.0 as u32)
    }

    /// Is the grid coordinate valid for this grid - within the grid's dimensions.
    /// This is the single place the hexagonal parallelogram rule is evaluated.
    #[inline]
    pub fn is_valid_coordinate(&self, coord: Coordinate) -> bool {
        (coord.row as usize) < self.rows.0 && self.column_span(coord.row).contains(&coord.column)
    }

    /// Convert a grid coordinate to a one dimensional index in the range 0..size.
    /// Returns None if the grid coordinate is invalid.
    #[inline]
    pub fn coordinate_to_index(&self, coord: Coordinate) -> Option<usize> {
        if self.is_valid_coordinate(coord) {
            let column_offset = (coord.column - self.first_column(coord.row)) as usize;
            Some(coord.row as usize * self.columns.0 + column_offset)
        } else {
            None
        }
    }

    #[inline]
    pub fn index_to_coordinate(&self, index: usize) -> Option<Coordinate> {
        if index < self.size().0 {
            let row = (index / self.columns.0) as u32;
            let column = (index % self.columns.0) as u32 + self.first_column(row);
            Some(Coordinate::new(row, column))
        } else {
            None
        }
    }

    /// The last valid coordinate in row major order.
    pub fn last_coordinate(&self) -> Coordinate {
        let last_row = (self.rows.0 - 1) as u32;
        Coordinate::new(last_row, self.column_span(last_row).end - 1)
    }

    /// Exact number of nodes and grid edges (walls between adjacent cells).
    #[inline]
    pub fn graph_size(&self) -> (NodesCount, EdgesCount) {
        (self.size(), self.edges)
    }
}

// None when the count does not fit a usize. Rows and columns are at least 1.
fn edges_count(kind: TopologyKind, r: usize, c: usize) -> Option<usize> {
    let horizontal = r.checked_mul(c - 1)?;
    let vertical = match kind {
        TopologyKind::Rectangular | TopologyKind::Tunneled => c.checked_mul(r - 1)?,
        // Between two rows either NW or NE loses one neighbour to the skew.
        TopologyKind::Hexagonal => c.checked_mul(2).map(|c2| c2 - 1)?.checked_mul(r - 1)?,
    };
    horizontal.checked_add(vertical)
}

#[cfg(test)]
mod tests {
    use quickcheck::{quickcheck, TestResult};

    use super::*;

    fn dims(kind: TopologyKind, rows: usize, columns: usize) -> GridDimensions {
        GridDimensions::new(kind, RowsCount(rows), ColumnsCount(columns)).unwrap()
    }

    #[test]
    fn zero_sized_dimensions_are_rejected() {
        assert!(GridDimensions::new(TopologyKind::Rectangular, RowsCount(0), ColumnsCount(3)).is_err());
        assert!(GridDimensions::new(TopologyKind::Hexagonal, RowsCount(3), ColumnsCount(0)).is_err());
    }

    #[test]
    fn edge_count_must_fit_a_usize() {
        let rows = u32::MAX as usize;
        let columns = u32::MAX as usize - (u32::MAX as usize / 2 + 1);
        if rows.checked_mul(columns).is_some() {
            // Enough cells to index, but too many hexagonal edges.
            let d = GridDimensions::new(TopologyKind::Hexagonal, RowsCount(rows), ColumnsCount(columns));
            assert!(d.is_err());
        }
        assert_eq!(edges_count(TopologyKind::Hexagonal, usize::MAX / 2, 3), None);
        assert_eq!(edges_count(TopologyKind::Rectangular, 4, 5), Some(31));
    }

    #[test]
    fn hex_rows_are_skewed() {
        let d = dims(TopologyKind::Hexagonal, 4, 3);
        assert_eq!(d.column_span(0), 0..3);
        assert_eq!(d.column_span(1), 1..4);
        assert_eq!(d.column_span(2), 1..4);
        assert_eq!(d.column_span(3), 2..5);
        assert!(d.is_valid_coordinate(Coordinate::new(3, 4)));
        assert!(!d.is_valid_coordinate(Coordinate::new(3, 1)));
        assert!(!d.is_valid_coordinate(Coordinate::new(0, 3)));
        assert_eq!(d.last_coordinate(), Coordinate::new(3, 4));
    }

    #[test]
    fn index_conversion_round_trips_every_cell() {
        for kind in &[TopologyKind::Rectangular, TopologyKind::Hexagonal] {
            let d = dims(*kind, 5, 4);
            for index in 0..d.size().0 {
                let coord = d.index_to_coordinate(index).unwrap();
                assert!(d.is_valid_coordinate(coord));
                assert_eq!(d.coordinate_to_index(coord), Some(index));
            }
            assert_eq!(d.index_to_coordinate(d.size().0), None);
        }
    }

    #[test]
    fn edge_counts() {
        assert_eq!(dims(TopologyKind::Rectangular, 5, 5).graph_size().1, EdgesCount(40));
        assert_eq!(dims(TopologyKind::Hexagonal, 3, 3).graph_size().1, EdgesCount(16));
        assert_eq!(dims(TopologyKind::Hexagonal, 1, 1).graph_size().1, EdgesCount(0));
    }

    #[test]
    fn hex_bounds_law() {
        fn prop(rows: u8, columns: u8, row: u8, column: u8) -> TestResult {
            if rows == 0 || columns == 0 {
                return TestResult::discard();
            }
            let d = dims(TopologyKind::Hexagonal, rows as usize, columns as usize);
            let (r, c) = (row as u32, column as u32);
            let law = r < rows as u32 && (r + 1) / 2 <= c && c < columns as u32 + (r + 1) / 2;
            TestResult::from_bool(d.is_valid_coordinate(Coordinate::new(r, c)) == law)
        }
        quickcheck(prop as fn(u8, u8, u8, u8) -> TestResult);
    }
}
