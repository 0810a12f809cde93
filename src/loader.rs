//! Reads a maze description into a grid.
//!
//! The description is a row count and a column count followed by one token per cell in row major
//! order. Whitespace between cell tokens is optional, so both of these describe the same maze:
//!
//! ```text
//! 2 3        2 3
//! e x #      ex#
//! # x s      #xs
//! ```
use std::fs;
use std::path::Path;

use error_chain::bail;
use tracing::{debug, warn};

use crate::cells::{CellState, Position};
use crate::errors::*;
use crate::grid::Grid;
use crate::units::{ColumnsCount, RowsCount};

/// A grid ready for exploring. The start cell has already been turned into an occupied cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMaze {
    pub grid: Grid,
    pub start: Position,
}

pub fn load_maze<P: AsRef<Path>>(path: P) -> Result<LoadedMaze> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .chain_err(|| format!("Failed to read maze file {}", path.display()))?;
    parse_maze(&text).chain_err(|| format!("Invalid maze file {}", path.display()))
}

pub fn parse_maze(text: &str) -> Result<LoadedMaze> {

    let mut input = text;
    let rows = next_count(&mut input)?;
    let columns = next_count(&mut input)?;
    if rows == 0 || columns == 0 {
        bail!(ErrorKind::EmptyGrid(rows, columns));
    }

    let cells_count = rows.checked_mul(columns)
        .ok_or(ErrorKind::OversizedGrid(rows, columns))?;

    // Check the tokens are all there before allocating the grid; the header alone can ask for
    // more cells than memory holds.
    let tokens = input.chars()
        .filter(|c| !c.is_whitespace())
        .take(cells_count)
        .collect::<Vec<char>>();
    if tokens.len() < cells_count {
        bail!(ErrorKind::TruncatedGrid(cells_count, tokens.len()));
    }

    let mut grid = Grid::new(RowsCount(rows), ColumnsCount(columns));
    for (index, token) in tokens.into_iter().enumerate() {
        let position = Position::from_row_major_index(index, ColumnsCount(columns));
        let state = CellState::from_token(token);
        match state {
            CellState::Start if grid.start().is_some() => {
                bail!(ErrorKind::DuplicateStart(position.row, position.col));
            }
            CellState::Exit if grid.exit().is_some() => {
                bail!(ErrorKind::DuplicateExit(position.row, position.col));
            }
            _ => {}
        }
        grid.set_cell(position, state);
    }

    let start = grid.occupy_start().ok_or(ErrorKind::MissingStart)?;
    if grid.exit().is_none() {
        warn!(rows, columns, "maze has no exit cell, exploration cannot succeed");
    }
    debug!(rows, columns, %start, exit = ?grid.exit(), "maze loaded");

    Ok(LoadedMaze { grid, start })
}

/// Consume the next whitespace separated unsigned number.
fn next_count(input: &mut &str) -> Result<usize> {
    let trimmed = input.trim_start();
    let digits_end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
    if digits_end == 0 {
        bail!(ErrorKind::MissingDimensions);
    }
    let (digits, rest) = trimmed.split_at(digits_end);
    *input = rest;
    Ok(digits.parse::<usize>()?)
}
