//! Spatial occupancy map for unit placement.

use code_defence_core::{CellCoord, RejectionReason, UnitId, WorldPoint};
use thiserror::Error;

/// Reasons a grid placement may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The cell already hosts a unit.
    #[error("cell {0:?} is occupied")]
    Occupied(CellCoord),
    /// The cell lies outside the grid.
    #[error("cell {0:?} is outside the grid")]
    OutOfBounds(CellCoord),
}

impl From<GridError> for RejectionReason {
    fn from(error: GridError) -> Self {
        match error {
            GridError::Occupied(_) => RejectionReason::OccupiedCell,
            GridError::OutOfBounds(_) => RejectionReason::OutOfBounds,
        }
    }
}

/// Single grid cell. Occupancy is derived from the owning unit, so a cell is
/// occupied exactly when it names a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    unit: Option<UnitId>,
}

impl Cell {
    /// Reports whether a unit sits in the cell.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.unit.is_some()
    }

    /// Unit sitting in the cell, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<UnitId> {
        self.unit
    }
}

/// Fixed-size matrix of cells stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![Cell::default(); capacity],
        }
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Returns the cell at the coordinate, if it lies inside the grid.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Reports whether a unit sits in the cell. Cells outside the grid are
    /// never occupied.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.cell(cell).is_some_and(Cell::is_occupied)
    }

    /// Unit sitting in the cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<UnitId> {
        self.cell(cell).and_then(Cell::unit)
    }

    /// Confirms that a unit could be placed in the cell.
    pub fn ensure_vacant(&self, cell: CellCoord) -> Result<(), GridError> {
        match self.cell(cell) {
            None => Err(GridError::OutOfBounds(cell)),
            Some(slot) if slot.is_occupied() => Err(GridError::Occupied(cell)),
            Some(_) => Ok(()),
        }
    }

    /// Records the unit as the occupant of the cell.
    pub fn place(&mut self, cell: CellCoord, unit: UnitId) -> Result<(), GridError> {
        self.ensure_vacant(cell)?;
        let index = self.index(cell).ok_or(GridError::OutOfBounds(cell))?;
        self.cells[index].unit = Some(unit);
        Ok(())
    }

    /// The 3×3 block centred on the cell, clipped to the grid edges, in
    /// row-major order. The centre is included.
    pub fn neighborhood(&self, center: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        let inside = self.contains(center);
        let column = i64::from(center.column());
        let row = i64::from(center.row());
        (row - 1..=row + 1)
            .flat_map(move |r| (column - 1..=column + 1).map(move |c| (c, r)))
            .filter(move |_| inside)
            .filter_map(|(c, r)| {
                let column = u32::try_from(c).ok()?;
                let row = u32::try_from(r).ok()?;
                Some(CellCoord::new(column, row))
            })
            .filter(move |cell| self.contains(*cell))
    }

    /// Cell containing the world point, if it lies over the grid.
    #[must_use]
    pub fn cell_at(&self, point: WorldPoint, cell_length: f32) -> Option<CellCoord> {
        if cell_length <= 0.0 || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = (point.x / cell_length).floor() as u32;
        let row = (point.y / cell_length).floor() as u32;
        let cell = CellCoord::new(column, row);
        self.contains(cell).then_some(cell)
    }

    /// Iterator over the occupied cells in row-major order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_occupied())
            .map(move |(index, _)| {
                let index = index as u32;
                CellCoord::new(index % columns, index / columns)
            })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
