use docopt::Docopt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_derive::Deserialize;
use mazerunner::{
    errors::*,
    generators,
    loader,
    options::{CandidateOrder, ExploreOptionsBuilder},
    renderers::{NullSink, PresentationSink, TerminalRenderer},
    runner,
    coordinator::RunState,
};
use std::{
    fs::File,
    io,
    io::prelude::*,
    sync::Arc,
    time::Duration,
};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Mazerunner

Usage:
    mazerunner_driver -h | --help
    mazerunner_driver run [<maze-file>] [--delay-ms=<n>] [--greedy] [--quiet]
    mazerunner_driver generate [--rows=<r>] [--cols=<c>] [--seed=<s>] [--binary-tree] [--out=<path>]

Options:
    -h --help              Show this screen.
    --delay-ms=<n>         Pause after drawing each frame, in milliseconds [default: 100].
    --greedy               Prefer the neighbour closest to the exit instead of south, east, north, west.
    --quiet                Do not draw the maze while exploring, only the final grid.
    --rows=<r>             Number of rooms down a generated maze [default: 10].
    --cols=<c>             Number of rooms across a generated maze [default: 20].
    --seed=<s>             Random seed for maze generation.
    --binary-tree          Generate with the binary tree algorithm instead of the recursive backtracker.
    --out=<path>           Write the generated maze to a file instead of stdout.

A maze file holds the row and column counts followed by one token per cell: 'x' floor,
'e' start, 's' exit, anything else a wall. The maze file defaults to maze.txt.
";

const DEFAULT_MAZE_FILE: &str = "maze.txt";

#[derive(Debug, Deserialize)]
struct MazeArgs {
    cmd_run: bool,
    cmd_generate: bool,
    arg_maze_file: Option<String>,
    flag_delay_ms: u64,
    flag_greedy: bool,
    flag_quiet: bool,
    flag_rows: usize,
    flag_cols: usize,
    flag_seed: Option<u64>,
    flag_binary_tree: bool,
    flag_out: String,
}

#[tokio::main]
async fn main() -> Result<()> {

    init_tracing();

    let args: MazeArgs = match Docopt::new(USAGE).and_then(|d| d.deserialize()) {
        Ok(args) => args,
        // --help and --version
        Err(e) if !e.fatal() => e.exit(),
        Err(e) => return Err(e.into()),
    };
    debug!(?args, "parsed arguments");

    if args.cmd_generate {
        generate_maze(&args)
    } else if args.cmd_run {
        run_maze(&args).await
    } else {
        Ok(())
    }
}

/// `RUST_LOG` controls the filter, `warn` if unset. Logs go to stderr so they stay out of the
/// maze frames drawn on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).compact())
        .init();
}

async fn run_maze(args: &MazeArgs) -> Result<()> {

    let maze_file = args.arg_maze_file.as_deref().unwrap_or(DEFAULT_MAZE_FILE);
    let maze = loader::load_maze(maze_file)?;

    let sink: Arc<dyn PresentationSink> = if args.flag_quiet {
        Arc::new(NullSink)
    } else {
        Arc::new(TerminalRenderer::new())
    };
    let frame_delay = if args.flag_quiet {
        Duration::from_millis(0)
    } else {
        Duration::from_millis(args.flag_delay_ms)
    };
    let candidate_order = if args.flag_greedy {
        CandidateOrder::NearestExit
    } else {
        CandidateOrder::Preference
    };
    let options = ExploreOptionsBuilder::new()
        .frame_delay(frame_delay)
        .candidate_order(candidate_order)
        .build();

    let report = runner::explore_maze(maze, sink, options).await;

    if args.flag_quiet {
        print!("{}", report.grid);
    }
    match report.outcome {
        RunState::ExitFound => println!("\nExit found! ({} explorers)\n", report.explorers_started),
        _ => println!("\nNo route to the exit was found. ({} explorers)\n", report.explorers_started),
    }

    Ok(())
}

fn generate_maze(args: &MazeArgs) -> Result<()> {

    if args.flag_rows == 0 || args.flag_cols == 0 {
        return Err(ErrorKind::EmptyGrid(args.flag_rows, args.flag_cols).into());
    }

    let mut rng = match args.flag_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let maze = if args.flag_binary_tree {
        generators::binary_tree(args.flag_rows, args.flag_cols, &mut rng)
    } else {
        generators::recursive_backtracker(args.flag_rows, args.flag_cols, &mut rng)
    };

    if args.flag_out.is_empty() {
        print!("{}", maze.to_text());
    } else {
        write_text_to_file(&maze.to_text(), &args.flag_out)
            .chain_err(|| format!("Failed to write maze to text file {}", args.flag_out))?;
    }

    Ok(())
}

fn write_text_to_file(data: &str, file_name: &str) -> io::Result<()> {
    let mut f = File::create(file_name)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}
