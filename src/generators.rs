//! Random perfect maze generation.
//!
//! Mazes are carved out of a grid of walls. Rooms sit on odd rows and columns, so an `r * c`
//! room maze is a `(2r + 1) * (2c + 1)` grid; linking two rooms turns the wall cell between
//! them into floor. The start is the top left room and the exit is cut into the east wall of the
//! bottom right room.
use bit_set::BitSet;
use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;

use crate::cells::{CellState, CompassPrimary, Position};
use crate::grid::Grid;
use crate::loader::LoadedMaze;
use crate::units::{ColumnsCount, RowsCount};

#[derive(Debug, Clone)]
pub struct GeneratedMaze {
    pub grid: Grid,
}

impl GeneratedMaze {
    /// Text in the loader's maze description format.
    pub fn to_text(&self) -> String {
        let RowsCount(rows) = self.grid.rows();
        let ColumnsCount(columns) = self.grid.columns();
        format!("{} {}\n{}", rows, columns, self.grid)
    }

    /// The maze as the loader would have produced it, start cell occupied.
    pub fn into_loaded(self) -> LoadedMaze {
        let mut grid = self.grid;
        let start = grid.occupy_start().expect("generated mazes always have a start");
        LoadedMaze { grid, start }
    }
}

struct Rooms {
    rows: usize,
    columns: usize,
    grid: Grid,
}

impl Rooms {
    fn new(rows: usize, columns: usize) -> Rooms {
        let mut grid = Grid::new(RowsCount(2 * rows + 1), ColumnsCount(2 * columns + 1));
        for row in 0..rows {
            for col in 0..columns {
                grid.set_cell(Rooms::cell_of(row, col), CellState::Floor);
            }
        }
        Rooms { rows, columns, grid }
    }

    #[inline]
    fn cell_of(row: usize, col: usize) -> Position {
        Position::new(2 * row + 1, 2 * col + 1)
    }

    #[inline]
    fn index(&self, room: Position) -> usize {
        room.row * self.columns + room.col
    }

    fn neighbour(&self, room: Position, dir: CompassPrimary) -> Option<Position> {
        room.offset(dir).filter(|r| r.row < self.rows && r.col < self.columns)
    }

    fn link(&mut self, a: Position, b: Position) {
        let wall = Position::new(a.row + b.row + 1, a.col + b.col + 1);
        self.grid.set_cell(wall, CellState::Floor);
    }

    fn finish(mut self) -> GeneratedMaze {
        self.grid.set_cell(Rooms::cell_of(0, 0), CellState::Start);
        let exit = Rooms::cell_of(self.rows - 1, self.columns - 1);
        self.grid.set_cell(Position::new(exit.row, exit.col + 1), CellState::Exit);
        GeneratedMaze { grid: self.grid }
    }
}

/// Binary tree maze: every room links either south or east, picked by coin flip, unless it is on
/// the southern or eastern boundary.
pub fn binary_tree<R: Rng>(rows: usize, columns: usize, rng: &mut R) -> GeneratedMaze {
    assert!(rows > 0 && columns > 0, "a maze needs at least one room");

    let mut rooms = Rooms::new(rows, columns);
    for row in 0..rows {
        for col in 0..columns {
            let room = Position::new(row, col);
            let candidates: SmallVec<[Position; 2]> =
                [CompassPrimary::South, CompassPrimary::East]
                    .iter()
                    .filter_map(|dir| rooms.neighbour(room, *dir))
                    .collect();
            if let Some(&next) = candidates.choose(rng) {
                rooms.link(room, next);
            }
        }
    }
    rooms.finish()
}

/// Recursive backtracker maze: a random depth first walk that backs up whenever it runs out of
/// unvisited rooms. Gives long winding corridors and few dead ends.
pub fn recursive_backtracker<R: Rng>(rows: usize, columns: usize, rng: &mut R) -> GeneratedMaze {
    assert!(rows > 0 && columns > 0, "a maze needs at least one room");

    let mut rooms = Rooms::new(rows, columns);
    let mut visited = BitSet::with_capacity(rows * columns);
    let first = Position::new(rng.gen_range(0..rows), rng.gen_range(0..columns));
    let _ = visited.insert(rooms.index(first));
    let mut stack = vec![first];

    while let Some(&room) = stack.last() {
        let unvisited: SmallVec<[Position; 4]> =
            [CompassPrimary::North, CompassPrimary::South, CompassPrimary::East, CompassPrimary::West]
                .iter()
                .filter_map(|dir| rooms.neighbour(room, *dir))
                .filter(|neighbour| !visited.contains(rooms.index(*neighbour)))
                .collect();

        if let Some(&next) = unvisited.choose(rng) {
            rooms.link(room, next);
            let _ = visited.insert(rooms.index(next));
            stack.push(next);
        } else {
            let _ = stack.pop();
        }
    }
    rooms.finish()
}


#[cfg(test)]
mod tests {

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::loader::parse_maze;

    // A perfect maze on r * c rooms has r * c - 1 links, so the floor count is fixed.
    fn check_perfect_maze(maze: &GeneratedMaze, rows: usize, columns: usize) {
        let g = &maze.grid;
        assert_eq!(g.rows(), RowsCount(2 * rows + 1));
        assert_eq!(g.columns(), ColumnsCount(2 * columns + 1));
        assert_eq!(g.count(CellState::Start), 1);
        assert_eq!(g.count(CellState::Exit), 1);
        let rooms = rows * columns;
        // start room is counted as Start, not Floor
        assert_eq!(g.count(CellState::Floor), rooms - 1 + rooms - 1);
        assert_eq!(g.start(), Some(Position::new(1, 1)));
        assert_eq!(g.exit(), Some(Position::new(2 * rows - 1, 2 * columns)));
    }

    #[test]
    fn recursive_backtracker_makes_perfect_mazes() {
        let mut rng = StdRng::seed_from_u64(42);
        for &(rows, columns) in &[(1, 1), (1, 5), (5, 1), (4, 6), (10, 10)] {
            let maze = recursive_backtracker(rows, columns, &mut rng);
            check_perfect_maze(&maze, rows, columns);
        }
    }

    #[test]
    fn binary_tree_makes_perfect_mazes() {
        let mut rng = StdRng::seed_from_u64(42);
        for &(rows, columns) in &[(1, 1), (1, 5), (5, 1), (4, 6), (10, 10)] {
            let maze = binary_tree(rows, columns, &mut rng);
            check_perfect_maze(&maze, rows, columns);
        }
    }

    #[test]
    fn same_seed_same_maze() {
        let a = recursive_backtracker(6, 6, &mut StdRng::seed_from_u64(9));
        let b = recursive_backtracker(6, 6, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.grid, b.grid);
    }

    #[test]
    fn text_loads_back() {
        let maze = recursive_backtracker(3, 4, &mut StdRng::seed_from_u64(3));
        let loaded = parse_maze(&maze.to_text()).expect("generated text should load");
        assert_eq!(loaded, maze.clone().into_loaded());
    }

    #[test]
    fn smallest_maze_has_adjacent_start_and_exit() {
        let maze = recursive_backtracker(1, 1, &mut StdRng::seed_from_u64(0));
        assert_eq!(maze.to_text(), "3 3\n# # #\n# e s\n# # #\n");
    }
}
