use std::sync::{Mutex, MutexGuard, PoisonError};

use fnv::FnvHashMap;
use smallvec::SmallVec;

use crate::cells::{CellState, CompassPrimary, Position, PREFERENCE_ORDER};
use crate::units::{ColumnsCount, ExplorerId, RowsCount};

pub type PositionSmallVec = SmallVec<[Position; 4]>;

/// Rectangular row major cell matrix with its start and exit coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<CellState>,
    rows: RowsCount,
    columns: ColumnsCount,
    start: Option<Position>,
    exit: Option<Position>,
}

impl Grid {
    /// A grid of walls.
    pub fn new(rows: RowsCount, columns: ColumnsCount) -> Grid {
        Grid {
            cells: vec![CellState::Wall; rows.0 * columns.0],
            rows,
            columns,
            start: None,
            exit: None,
        }
    }

    #[inline]
    pub fn rows(&self) -> RowsCount {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> ColumnsCount {
        self.columns
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn start(&self) -> Option<Position> {
        self.start
    }

    #[inline]
    pub fn exit(&self) -> Option<Position> {
        self.exit
    }

    /// Is the position within the grid's dimensions
    #[inline]
    pub fn is_valid_position(&self, position: Position) -> bool {
        position.is_within(self.rows, self.columns)
    }

    /// Convert a position to a one dimensional index in the range 0...grid.size().
    /// Returns None if the position is invalid.
    #[inline]
    pub fn position_to_index(&self, position: Position) -> Option<usize> {
        if self.is_valid_position(position) {
            Some(position.row * self.columns.0 + position.col)
        } else {
            None
        }
    }

    #[inline]
    pub fn cell(&self, position: Position) -> Option<CellState> {
        self.position_to_index(position).map(|index| self.cells[index])
    }

    /// Load time mutation of a cell. Tracks the start and exit positions; a later start or exit
    /// replaces an earlier one.
    ///
    /// Returns false if the position is invalid.
    pub fn set_cell(&mut self, position: Position, state: CellState) -> bool {
        if let Some(index) = self.position_to_index(position) {
            match state {
                CellState::Start => self.start = Some(position),
                CellState::Exit => self.exit = Some(position),
                _ => {
                    if self.start == Some(position) {
                        self.start = None;
                    }
                    if self.exit == Some(position) {
                        self.exit = None;
                    }
                }
            }
            self.cells[index] = state;
            true
        } else {
            false
        }
    }

    /// Start cells are converted to `Occupied` before exploring; the start position is kept.
    pub fn occupy_start(&mut self) -> Option<Position> {
        let start = self.start?;
        let index = self.position_to_index(start)?;
        self.cells[index] = CellState::Occupied;
        Some(start)
    }

    /// True iff in bounds and the cell is `Floor`, `Exit` or `Occupied`.
    #[inline]
    pub fn is_traversable(&self, position: Position) -> bool {
        self.cell(position).map_or(false, |state| state.is_traversable())
    }

    #[inline]
    pub fn is_exit(&self, position: Position) -> bool {
        self.exit == Some(position)
    }

    /// Mark a cell as `Occupied`.
    /// Returns whether the cell is occupied afterwards; walls, visited and invalid cells are left
    /// untouched.
    pub fn claim(&mut self, position: Position) -> bool {
        match self.position_to_index(position) {
            Some(index) if self.cells[index].is_claimable() => {
                self.cells[index] = CellState::Occupied;
                true
            }
            _ => false,
        }
    }

    /// Mark an `Occupied` cell as `Visited`. The exit is never released, and anything not
    /// currently occupied is left alone.
    ///
    /// Returns true if a transition happened.
    pub fn release(&mut self, position: Position) -> bool {
        if self.is_exit(position) {
            return false;
        }
        match self.position_to_index(position) {
            Some(index) if self.cells[index] == CellState::Occupied => {
                self.cells[index] = CellState::Visited;
                true
            }
            _ => false,
        }
    }

    pub fn neighbour_at_direction(&self,
                                  position: Position,
                                  direction: CompassPrimary)
                                  -> Option<Position> {
        position.offset(direction).filter(|neighbour| self.is_valid_position(*neighbour))
    }

    /// Neighbours an explorer could step onto, in preference order.
    pub fn traversable_neighbours(&self, position: Position) -> PositionSmallVec {
        PREFERENCE_ORDER.iter()
            .filter_map(|dir| self.neighbour_at_direction(position, *dir))
            .filter(|neighbour| self.is_traversable(*neighbour))
            .collect()
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&cell| cell == state).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        let columns = self.columns;
        (0..self.size()).map(move |index| Position::from_row_major_index(index, columns))
    }

    pub fn iter_row(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.chunks(self.columns.0.max(1))
    }
}

/// A copy of the cell matrix taken inside the exclusive section, for the presentation sink.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub grid: Grid,
    pub active_explorers: usize,
}

impl Snapshot {
    pub fn occupied_count(&self) -> usize {
        self.grid.count(CellState::Occupied)
    }
}

/// Everything guarded by the store's single lock: the cells and which explorer is standing where.
#[derive(Debug)]
pub struct GridState {
    pub grid: Grid,
    active: FnvHashMap<ExplorerId, Position>,
}

impl GridState {
    pub fn enter(&mut self, explorer: ExplorerId, position: Position) {
        let _ = self.active.insert(explorer, position);
    }

    pub fn leave(&mut self, explorer: ExplorerId) -> Option<Position> {
        self.active.remove(&explorer)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.clone(),
            active_explorers: self.active.len(),
        }
    }
}

/// The shared grid. One lock covers the whole matrix and the active position bookkeeping, so a
/// check-then-claim sequence made while holding the guard is atomic with respect to other
/// explorers.
#[derive(Debug)]
pub struct GridStore {
    inner: Mutex<GridState>,
}

impl GridStore {
    pub fn new(grid: Grid) -> GridStore {
        let capacity = grid.size() / 4;
        GridStore {
            inner: Mutex::new(GridState {
                grid,
                active: FnvHashMap::with_capacity_and_hasher(capacity, Default::default()),
            }),
        }
    }

    /// Enter the exclusive section. An explorer that panicked while holding the lock leaves every
    /// cell in a legal state, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, GridState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_traversable(&self, position: Position) -> bool {
        self.lock().grid.is_traversable(position)
    }

    pub fn claim(&self, position: Position) -> bool {
        self.lock().grid.claim(position)
    }

    pub fn release(&self, position: Position) -> bool {
        self.lock().grid.release(position)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn into_grid(self) -> Grid {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner).grid
    }
}
