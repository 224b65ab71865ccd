use std::fmt;

use crate::cells::Coordinate;
use crate::grid_dimensions::GridDimensions;

/// Row major iteration over every valid coordinate of a grid.
#[derive(Clone)]
pub struct CellIter {
    dimensions: GridDimensions,
    current_cell_number: usize,
    cells_count: usize,
}

impl CellIter {
    pub fn new(dimensions: GridDimensions) -> CellIter {
        CellIter {
            dimensions,
            current_cell_number: 0,
            cells_count: dimensions.size().0,
        }
    }
}

impl fmt::Debug for CellIter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "CellIter :: current_cell_number: {:?}, cells_count: {:?}",
               self.current_cell_number,
               self.cells_count)
    }
}

impl ExactSizeIterator for CellIter {} // default impl using size_hint()
impl Iterator for CellIter {
    type Item = Coordinate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.current_cell_number < self.cells_count {
            let coord = self.dimensions.index_to_coordinate(self.current_cell_number);
            self.current_cell_number += 1;
            coord
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let lower_bound = self.cells_count - self.current_cell_number;
        let upper_bound = lower_bound;
        (lower_bound, Some(upper_bound))
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::cells::TopologyKind;
    use crate::units::{ColumnsCount, RowsCount};

    #[test]
    fn hex_iteration_follows_the_skew() {
        let d = GridDimensions::new(TopologyKind::Hexagonal, RowsCount(3), ColumnsCount(2)).unwrap();
        let coords = CellIter::new(d).map(|c| (c.row, c.column)).collect_vec();
        assert_eq!(coords, vec![(0, 0), (0, 1), (1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn exact_size() {
        let d = GridDimensions::new(TopologyKind::Rectangular, RowsCount(4), ColumnsCount(7)).unwrap();
        let mut iter = CellIter::new(d);
        assert_eq!(iter.len(), 28);
        let _ = iter.next();
        assert_eq!(iter.len(), 27);
        assert!(iter.all(|c| d.is_valid_coordinate(c)));
    }
}
