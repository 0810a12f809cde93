use std::fmt;

use crate::units::{ColumnsCount, RowsCount};

/// The state of one grid cell during an exploration run.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub enum CellState {
    Wall,
    Floor,
    Occupied,
    Visited,
    Exit,
    Start,
}

pub const FLOOR_TOKEN: char = 'x';
pub const START_TOKEN: char = 'e';
pub const EXIT_TOKEN: char = 's';

impl CellState {
    /// Maps a maze description token to a cell state.
    /// Anything that is not a floor, start or exit token is a wall.
    pub fn from_token(token: char) -> CellState {
        match token {
            FLOOR_TOKEN => CellState::Floor,
            START_TOKEN => CellState::Start,
            EXIT_TOKEN => CellState::Exit,
            _ => CellState::Wall,
        }
    }

    pub fn as_token(&self) -> char {
        match *self {
            CellState::Wall => '#',
            CellState::Floor => FLOOR_TOKEN,
            CellState::Occupied => 'o',
            CellState::Visited => '.',
            CellState::Exit => EXIT_TOKEN,
            CellState::Start => START_TOKEN,
        }
    }

    /// Can an explorer step onto a cell in this state?
    ///
    /// `Occupied` counts as traversable, so an explorer may walk onto a cell another live explorer
    /// is standing on and the two paths merge.
    #[inline]
    pub fn is_traversable(&self) -> bool {
        matches!(*self, CellState::Floor | CellState::Exit | CellState::Occupied)
    }

    #[inline]
    pub fn is_claimable(&self) -> bool {
        matches!(*self,
                 CellState::Floor | CellState::Exit | CellState::Start | CellState::Occupied)
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }

    #[inline]
    pub fn from_row_major_index(index: usize, columns: ColumnsCount) -> Position {
        let ColumnsCount(width) = columns;
        Position::new(index / width, index % width)
    }

    #[inline]
    pub fn is_within(&self, rows: RowsCount, columns: ColumnsCount) -> bool {
        self.row < rows.0 && self.col < columns.0
    }

    pub fn manhattan_distance(&self, other: Position) -> usize {
        let row_delta = if self.row > other.row { self.row - other.row } else { other.row - self.row };
        let col_delta = if self.col > other.col { self.col - other.col } else { other.col - self.col };
        row_delta + col_delta
    }

    /// Creates a new `Position` offset 1 cell away in the given direction.
    /// Returns None if the position would have a negative coordinate; the upper bounds are the
    /// grid's business.
    pub fn offset(&self, dir: CompassPrimary) -> Option<Position> {
        let (row, col) = (self.row, self.col);
        match dir {
            CompassPrimary::North => {
                if row > 0 {
                    Some(Position::new(row - 1, col))
                } else {
                    None
                }
            }
            CompassPrimary::South => Some(Position::new(row + 1, col)),
            CompassPrimary::East => Some(Position::new(row, col + 1)),
            CompassPrimary::West => {
                if col > 0 {
                    Some(Position::new(row, col - 1))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CompassPrimary {
    North,
    South,
    East,
    West,
}

/// Neighbour preference order. The first traversable neighbour in this order is the one an
/// explorer continues along; the others are handed to new explorers.
pub const PREFERENCE_ORDER: [CompassPrimary; 4] = [CompassPrimary::South,
                                                   CompassPrimary::East,
                                                   CompassPrimary::North,
                                                   CompassPrimary::West];


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn tokens_map_to_states() {
        assert_eq!(CellState::from_token('x'), CellState::Floor);
        assert_eq!(CellState::from_token('e'), CellState::Start);
        assert_eq!(CellState::from_token('s'), CellState::Exit);
        assert_eq!(CellState::from_token('#'), CellState::Wall);
        assert_eq!(CellState::from_token('1'), CellState::Wall);
    }

    #[test]
    fn traversable_states() {
        let traversable = [CellState::Floor, CellState::Exit, CellState::Occupied];
        let blocked = [CellState::Wall, CellState::Visited, CellState::Start];
        for state in &traversable {
            assert!(state.is_traversable(), "{:?}", state);
        }
        for state in &blocked {
            assert!(!state.is_traversable(), "{:?}", state);
        }
    }

    #[test]
    fn walls_and_visited_cells_cannot_be_claimed() {
        assert!(!CellState::Wall.is_claimable());
        assert!(!CellState::Visited.is_claimable());
        assert!(CellState::Start.is_claimable());
    }

    #[test]
    fn offsets() {
        let p = |row, col| Position::new(row, col);
        assert_eq!(p(0, 0).offset(CompassPrimary::North), None);
        assert_eq!(p(0, 0).offset(CompassPrimary::West), None);
        assert_eq!(p(0, 0).offset(CompassPrimary::South), Some(p(1, 0)));
        assert_eq!(p(0, 0).offset(CompassPrimary::East), Some(p(0, 1)));
        assert_eq!(p(3, 3).offset(CompassPrimary::North), Some(p(2, 3)));
        assert_eq!(p(3, 3).offset(CompassPrimary::West), Some(p(3, 2)));
    }

    #[test]
    fn row_major_index() {
        let columns = ColumnsCount(3);
        assert_eq!(Position::from_row_major_index(0, columns), Position::new(0, 0));
        assert_eq!(Position::from_row_major_index(4, columns), Position::new(1, 1));
        assert_eq!(Position::from_row_major_index(8, columns), Position::new(2, 2));
    }

    #[test]
    fn manhattan() {
        assert_eq!(Position::new(0, 0).manhattan_distance(Position::new(2, 3)), 5);
        assert_eq!(Position::new(2, 3).manhattan_distance(Position::new(0, 0)), 5);
        assert_eq!(Position::new(1, 1).manhattan_distance(Position::new(1, 1)), 0);
    }
}
