//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;

use crate::core::types::Vec2;

pub type CellCoord = (i32, i32);

/// Sparse hash grid for O(1) neighbor queries
///
/// Items are stored with the position they were inserted at, so a query
/// never needs to look anything up elsewhere.
#[derive(Debug, Clone)]
pub struct SparseHashGrid<T> {
    cell_size: f64,
    cells: AHashMap<CellCoord, Vec<(T, Vec2)>>,
}

impl<T: Copy> SparseHashGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
        }
    }

    #[inline]
    pub fn cell_coord(&self, pos: Vec2) -> CellCoord {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, item: T, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((item, pos));
    }

    /// Occupied cells with their contents, in no particular order
    pub fn occupied(&self) -> impl Iterator<Item = (CellCoord, &[(T, Vec2)])> + '_ {
        self.cells.iter().map(|(&coord, items)| (coord, items.as_slice()))
    }

    /// All items in the 3x3 block of cells centred on `coord`
    pub fn neighborhood(&self, coord: CellCoord) -> impl Iterator<Item = (T, Vec2)> + '_ {
        let (cx, cy) = coord;
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                self.cells
                    .get(&(cx + dx, cy + dy))
                    .into_iter()
                    .flatten()
                    .copied()
            })
        })
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, items: impl Iterator<Item = (T, Vec2)>) {
        self.clear();
        for (item, pos) in items {
            self.insert(item, pos);
        }
    }
}
