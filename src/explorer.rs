//! One explorer walks a single path through the maze.
//!
//! Every iteration it looks at its traversable neighbours in preference order while holding the
//! grid lock. It hands every neighbour but the first to a new explorer, moves onto the first one,
//! then waits for the explorers it just started before taking its next step. An explorer stops at
//! a dead end, when it steps onto the exit, or when it sees that some other explorer got there.
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::task::JoinSet;
use tracing::{debug, error, trace};

use crate::cells::Position;
use crate::grid::{PositionSmallVec, Snapshot};
use crate::runner::Exploration;
use crate::units::ExplorerId;

/// How a single explorer's walk ended.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum ExplorerOutcome {
    ReachedExit,
    DeadEnd,
    /// The exit was found by another explorer.
    Cancelled,
}

/// Start an explorer at `start`.
///
/// The explorer is registered with the coordinator before this returns, so it is counted as
/// active from the moment it is handed to the runtime.
pub fn explore(shared: Arc<Exploration>, start: Position) -> BoxFuture<'static, ExplorerOutcome> {
    Explorer::new(shared, start).run().boxed()
}

enum Arrival {
    Claimed(Snapshot),
    AtExit(Snapshot),
    // The cell was walked over and abandoned before this explorer got to it.
    Lost,
    Cancelled,
}

enum Step {
    Advanced {
        snapshot: Snapshot,
        branches: PositionSmallVec,
    },
    ReachedExit(Snapshot),
    DeadEnd,
    Cancelled,
}

struct Explorer {
    id: ExplorerId,
    position: Position,
    // Whether `position` is a cell this explorer claimed and has not released.
    holds_claim: bool,
    shared: Arc<Exploration>,
}

impl Explorer {
    fn new(shared: Arc<Exploration>, start: Position) -> Explorer {
        shared.coordinator.start();
        let id = shared.next_explorer_id();
        debug!(explorer = id.0, %start, "explorer launched");
        Explorer {
            id,
            position: start,
            holds_claim: false,
            shared,
        }
    }

    async fn run(mut self) -> ExplorerOutcome {
        let outcome = self.walk().await;
        if let Some(snapshot) = self.cleanup() {
            self.present(snapshot).await;
        }
        debug!(explorer = self.id.0, position = %self.position, ?outcome, "explorer finished");
        outcome
        // dropping `self` tells the coordinator this explorer is done
    }

    async fn walk(&mut self) -> ExplorerOutcome {

        match self.arrive() {
            Arrival::Claimed(snapshot) => self.present(snapshot).await,
            Arrival::AtExit(snapshot) => {
                self.present(snapshot).await;
                return ExplorerOutcome::ReachedExit;
            }
            Arrival::Lost => return ExplorerOutcome::DeadEnd,
            Arrival::Cancelled => return ExplorerOutcome::Cancelled,
        }

        loop {
            if self.shared.coordinator.is_exit_found() {
                return ExplorerOutcome::Cancelled;
            }

            match self.step() {
                Step::Advanced { snapshot, branches } => {
                    let branches = self.branch(&branches);
                    self.present(snapshot).await;
                    self.join(branches).await;
                }
                Step::ReachedExit(snapshot) => {
                    self.present(snapshot).await;
                    return ExplorerOutcome::ReachedExit;
                }
                Step::DeadEnd => return ExplorerOutcome::DeadEnd,
                Step::Cancelled => return ExplorerOutcome::Cancelled,
            }
        }
    }

    /// Claim the starting cell. The root explorer's start cell was occupied when the maze was
    /// loaded, so its claim changes nothing.
    fn arrive(&mut self) -> Arrival {
        let coordinator = &self.shared.coordinator;
        let mut state = self.shared.store.lock();

        if coordinator.is_exit_found() {
            return Arrival::Cancelled;
        }

        // A branch can start directly on the exit when it was not the preferred candidate.
        if state.grid.is_exit(self.position) && state.grid.is_traversable(self.position) {
            if !coordinator.signal_exit_found() {
                return Arrival::Cancelled;
            }
            let _ = state.grid.claim(self.position);
            debug!(explorer = self.id.0, position = %self.position, "exit found");
            return Arrival::AtExit(state.snapshot());
        }

        if !state.grid.claim(self.position) {
            trace!(explorer = self.id.0, position = %self.position, "start cell already abandoned");
            return Arrival::Lost;
        }
        self.holds_claim = true;
        state.enter(self.id, self.position);
        Arrival::Claimed(state.snapshot())
    }

    /// Look around and move, all inside one exclusive section.
    fn step(&mut self) -> Step {
        let coordinator = &self.shared.coordinator;
        let mut state = self.shared.store.lock();

        if coordinator.is_exit_found() {
            return Step::Cancelled;
        }

        let mut candidates = state.grid.traversable_neighbours(self.position);
        if candidates.is_empty() {
            trace!(explorer = self.id.0, position = %self.position, "dead end");
            return Step::DeadEnd;
        }
        self.shared.options.candidate_order().rank(&mut candidates, state.grid.exit());
        let next = candidates[0];

        if state.grid.is_exit(next) {
            if !coordinator.signal_exit_found() {
                return Step::Cancelled;
            }
            let _ = state.grid.release(self.position);
            let _ = state.grid.claim(next);
            let _ = state.leave(self.id);
            self.position = next;
            // The exit stays occupied for good; there is nothing left to release.
            self.holds_claim = false;
            debug!(explorer = self.id.0, position = %next, "exit found");
            return Step::ReachedExit(state.snapshot());
        }

        let branches = candidates[1..].iter().cloned().collect();
        let _ = state.grid.release(self.position);
        self.holds_claim = state.grid.claim(next);
        trace!(explorer = self.id.0, from = %self.position, to = %next, "advance");
        self.position = next;
        state.enter(self.id, next);

        Step::Advanced {
            snapshot: state.snapshot(),
            branches,
        }
    }

    /// Start an explorer on every branch, unless the exit has been found in the meantime.
    /// Runs outside the grid lock: a branch explorer that is dropped straight away cleans up
    /// through the lock.
    fn branch(&self, positions: &[Position]) -> JoinSet<ExplorerOutcome> {
        let mut branches = JoinSet::new();
        for &branch in positions {
            if self.shared.coordinator.is_exit_found() {
                break;
            }
            trace!(explorer = self.id.0, position = %self.position, %branch, "branching");
            let _ = branches.spawn(explore(self.shared.clone(), branch));
        }
        branches
    }

    /// Wait for every explorer started in the last step, including their own branches.
    async fn join(&self, mut branches: JoinSet<ExplorerOutcome>) {
        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok(outcome) => trace!(explorer = self.id.0, ?outcome, "branch joined"),
                Err(e) => error!(explorer = self.id.0, error = %e, "branch explorer failed"),
            }
        }
    }

    /// Leave the bookkeeping and give up the current cell. Safe to call more than once.
    ///
    /// Returns a final snapshot to present, unless the exit has been found.
    fn cleanup(&mut self) -> Option<Snapshot> {
        let mut state = self.shared.store.lock();
        let _ = state.leave(self.id);
        if self.holds_claim {
            let _ = state.grid.release(self.position);
            self.holds_claim = false;
        }
        if self.shared.coordinator.is_exit_found() {
            None
        } else {
            Some(state.snapshot())
        }
    }

    async fn present(&self, snapshot: Snapshot) {
        self.shared.sink.present(&snapshot);
        let delay = self.shared.options.frame_delay();
        if delay > std::time::Duration::from_millis(0) {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        // Normally a no-op as `run` already cleaned up; matters when an explorer panicked.
        let _ = self.cleanup();
        self.shared.coordinator.finish();
    }
}


#[cfg(test)]
mod tests {

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::cells::CellState;
    use crate::coordinator::RunState;
    use crate::loader::parse_maze;
    use crate::options::ExploreOptions;
    use crate::renderers::{NullSink, PresentationSink, SnapshotRecorder};

    /// Panics the first time it is shown `position` occupied.
    struct PanicOnArrival {
        position: Position,
        fired: AtomicBool,
    }

    impl PresentationSink for PanicOnArrival {
        fn present(&self, snapshot: &Snapshot) {
            if snapshot.grid.cell(self.position) == Some(CellState::Occupied)
                && !self.fired.swap(true, Ordering::SeqCst) {
                panic!("sink failed at {}", self.position);
            }
        }
    }

    fn exploration(text: &str) -> (Arc<Exploration>, Position) {
        let maze = parse_maze(text).expect("valid maze");
        let shared = Exploration::new(maze.grid, Arc::new(NullSink), ExploreOptions::default());
        (Arc::new(shared), maze.start)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn adjacent_exit() {
        let (shared, start) = exploration("1 2\ne s");
        let outcome = explore(shared.clone(), start).await;

        assert_eq!(outcome, ExplorerOutcome::ReachedExit);
        let grid = shared.store.snapshot().grid;
        assert_eq!(grid.cell(Position::new(0, 0)), Some(CellState::Visited));
        assert_eq!(grid.cell(Position::new(0, 1)), Some(CellState::Occupied));
        assert_eq!(shared.coordinator.active(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dead_end_corridor() {
        let (shared, start) = exploration("1 4\ne x x #");
        let outcome = explore(shared.clone(), start).await;

        assert_eq!(outcome, ExplorerOutcome::DeadEnd);
        let grid = shared.store.snapshot().grid;
        assert_eq!(grid.count(CellState::Visited), 3);
        assert_eq!(grid.count(CellState::Occupied), 0);
        assert_eq!(shared.coordinator.active(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn branch_starting_on_the_exit_finds_it() {
        // South of the start is preferred, the exit to the east is handed to a branch.
        let (shared, start) = exploration("2 2\ne s\nx #");
        let outcome = explore(shared.clone(), start).await;

        assert!(shared.coordinator.is_exit_found());
        assert_ne!(outcome, ExplorerOutcome::ReachedExit);
        let grid = shared.store.snapshot().grid;
        assert_eq!(grid.cell(Position::new(0, 1)), Some(CellState::Occupied));
        assert_eq!(grid.count(CellState::Occupied), 1);
        assert_eq!(shared.coordinator.active(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn explorer_started_after_the_exit_was_found_does_nothing() {
        let (shared, _) = exploration("1 3\ne x s");
        assert!(shared.coordinator.signal_exit_found());
        let outcome = explore(shared.clone(), Position::new(0, 1)).await;

        assert_eq!(outcome, ExplorerOutcome::Cancelled);
        let grid = shared.store.snapshot().grid;
        assert_eq!(grid.cell(Position::new(0, 1)), Some(CellState::Floor));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn explorer_on_an_abandoned_cell_stops() {
        let (shared, _) = exploration("1 3\ne x s");
        {
            let mut state = shared.store.lock();
            assert!(state.grid.claim(Position::new(0, 1)));
            assert!(state.grid.release(Position::new(0, 1)));
        }
        let outcome = explore(shared.clone(), Position::new(0, 1)).await;
        assert_eq!(outcome, ExplorerOutcome::DeadEnd);
        assert!(!shared.coordinator.is_exit_found());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_branch_does_not_take_down_its_parent() {
        // The root goes south into a dead end; the branch east towards the exit panics as soon
        // as its first snapshot is presented.
        let maze = parse_maze("2 3\ne x s\nx # #").expect("valid maze");
        let branch_start = Position::new(0, 1);
        let sink = Arc::new(PanicOnArrival {
            position: branch_start,
            fired: AtomicBool::new(false),
        });
        let shared = Arc::new(Exploration::new(maze.grid, sink.clone(), ExploreOptions::default()));

        let outcome = explore(shared.clone(), maze.start).await;
        shared.coordinator.wait_idle().await;

        assert!(sink.fired.load(Ordering::SeqCst));
        assert_eq!(outcome, ExplorerOutcome::DeadEnd);
        assert_eq!(shared.coordinator.state(), RunState::Exhausted);
        assert_eq!(shared.coordinator.active(), 0);
        assert_eq!(shared.coordinator.started(), 2);

        let grid = shared.store.snapshot().grid;
        assert_eq!(grid.count(CellState::Occupied), 0);
        assert_eq!(grid.cell(branch_start), Some(CellState::Visited));
        assert_eq!(grid.cell(Position::new(0, 2)), Some(CellState::Exit));
        assert_eq!(shared.store.lock().active_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cleanup_is_idempotent() {
        let (shared, start) = exploration("1 3\ne x #");
        let mut explorer = Explorer::new(shared.clone(), start);
        match explorer.arrive() {
            Arrival::Claimed(snapshot) => assert_eq!(snapshot.active_explorers, 1),
            _ => panic!("start cell should be claimed"),
        }

        let first = explorer.cleanup().expect("exit not found so a snapshot is due");
        let second = explorer.cleanup().expect("exit not found so a snapshot is due");
        assert_eq!(first.grid, second.grid);
        assert_eq!(second.active_explorers, 0);
        assert_eq!(second.grid.cell(start), Some(CellState::Visited));

        drop(explorer);
        assert_eq!(shared.coordinator.active(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_position_is_presented() {
        let maze = parse_maze("1 4\ne x x s").expect("valid maze");
        let recorder = Arc::new(SnapshotRecorder::new());
        let options = crate::options::ExploreOptionsBuilder::new()
            .frame_delay(Duration::from_millis(1))
            .build();
        let shared = Arc::new(Exploration::new(maze.grid, recorder.clone(), options));

        let outcome = explore(shared, maze.start).await;
        assert_eq!(outcome, ExplorerOutcome::ReachedExit);

        // start, two advances, then the exit
        let snapshots = recorder.take();
        assert_eq!(snapshots.len(), 4);
        let occupied_columns = snapshots.iter()
            .map(|snapshot| {
                snapshot.grid
                    .iter()
                    .find(|&p| snapshot.grid.cell(p) == Some(CellState::Occupied))
                    .map(|p| p.col)
            })
            .collect::<Vec<_>>();
        assert_eq!(occupied_columns, vec![Some(0), Some(1), Some(2), Some(3)]);
    }
}
