use std::fmt;

use itertools::Itertools;

use crate::grid::{Grid, Snapshot};

// One token per cell, space separated, one line per row:
//
// # # # #
// # . o #
// # x s #
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.iter_row() {
            writeln!(f, "{}", row.iter().map(|cell| cell.as_token()).join(" "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.grid)?;
        writeln!(f, "explorers: {}", self.active_explorers)
    }
}
