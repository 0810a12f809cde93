use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::coordinator::{Coordinator, RunState};
use crate::explorer;
use crate::grid::{Grid, GridStore};
use crate::loader::LoadedMaze;
use crate::options::ExploreOptions;
use crate::renderers::PresentationSink;
use crate::units::ExplorerId;

/// Everything the explorers of one run share.
pub struct Exploration {
    pub(crate) store: GridStore,
    pub(crate) coordinator: Coordinator,
    pub(crate) sink: Arc<dyn PresentationSink>,
    pub(crate) options: ExploreOptions,
    next_explorer_id: AtomicUsize,
}

impl Exploration {
    pub fn new(grid: Grid,
               sink: Arc<dyn PresentationSink>,
               options: ExploreOptions)
               -> Exploration {
        Exploration {
            store: GridStore::new(grid),
            coordinator: Coordinator::new(),
            sink,
            options,
            next_explorer_id: AtomicUsize::new(0),
        }
    }

    pub(crate) fn next_explorer_id(&self) -> ExplorerId {
        ExplorerId(self.next_explorer_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn store(&self) -> &GridStore {
        &self.store
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// `ExitFound` or `Exhausted`.
    pub outcome: RunState,
    pub explorers_started: usize,
    pub grid: Grid,
}

impl RunReport {
    pub fn exit_found(&self) -> bool {
        self.outcome == RunState::ExitFound
    }
}

/// Explore a loaded maze until the exit is found or every explorer has run out of moves.
///
/// Must be called from within a tokio runtime; explorers are spawned onto it.
pub async fn explore_maze(maze: LoadedMaze,
                          sink: Arc<dyn PresentationSink>,
                          options: ExploreOptions)
                          -> RunReport {

    let LoadedMaze { grid, start } = maze;
    let exploration = Arc::new(Exploration::new(grid, sink, options));

    let root = tokio::spawn(explorer::explore(exploration.clone(), start));
    match root.await {
        Ok(outcome) => info!(?outcome, "root explorer finished"),
        Err(e) => error!(error = %e, "root explorer failed"),
    }

    // The root joined its own branches, this catches anything still unwinding.
    exploration.coordinator.wait_idle().await;

    let outcome = match exploration.coordinator.state() {
        RunState::ExitFound => RunState::ExitFound,
        _ => RunState::Exhausted,
    };
    let explorers_started = exploration.coordinator.started();
    info!(?outcome, explorers_started, "exploration finished");

    RunReport {
        outcome,
        explorers_started,
        grid: exploration.store.snapshot().grid,
    }
}
