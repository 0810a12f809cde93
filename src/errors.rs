// Create the Error, ErrorKind, ResultExt, and Result types.
// Result is a typedef of std `Result` with the error type our own `Error`.
// ResultExt adds the `chain_err` trait method.
use error_chain::*;

error_chain! {

    foreign_links {
        Io(::std::io::Error);
        ParseInt(::std::num::ParseIntError);
        DocOptFailure(::docopt::Error);
    }

    errors {
        MissingDimensions {
            description("maze description does not start with row and column counts")
            display("maze description does not start with row and column counts")
        }
        EmptyGrid(rows: usize, columns: usize) {
            description("maze has no cells")
            display("maze has no cells: {} rows by {} columns", rows, columns)
        }
        OversizedGrid(rows: usize, columns: usize) {
            description("maze dimensions are too large")
            display("maze dimensions are too large: {} rows by {} columns", rows, columns)
        }
        TruncatedGrid(expected: usize, found: usize) {
            description("maze description has fewer cells than its dimensions")
            display("maze description declares {} cells but only {} were found", expected, found)
        }
        MissingStart {
            description("no start cell in maze")
            display("no start cell ('e') in maze")
        }
        DuplicateStart(row: usize, col: usize) {
            description("more than one start cell in maze")
            display("second start cell ('e') at row {}, column {}", row, col)
        }
        DuplicateExit(row: usize, col: usize) {
            description("more than one exit cell in maze")
            display("second exit cell ('s') at row {}, column {}", row, col)
        }
    }
}
