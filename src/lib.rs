//! **mazerunner** explores a grid maze with one concurrent explorer per branching path, all
//! racing towards the exit over a shared grid.

pub mod cells;
pub mod coordinator;
pub mod errors;
pub mod explorer;
pub mod generators;
pub mod grid;
pub mod grid_displays;
pub mod loader;
pub mod options;
pub mod renderers;
pub mod runner;
pub mod units;
