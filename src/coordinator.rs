use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Notify;
use tracing::trace;

/// Where a whole exploration run is. `ExitFound` and `Exhausted` are terminal.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum RunState {
    Running,
    ExitFound,
    Exhausted,
}

/// Run wide termination flag plus a wait group over live explorers.
///
/// Neither needs the grid lock: the flag only ever goes from unset to set, and the counter is
/// only used to find out when every explorer has unwound.
#[derive(Debug, Default)]
pub struct Coordinator {
    exit_found: AtomicBool,
    active: AtomicUsize,
    started: AtomicUsize,
    idle: Notify,
}

impl Coordinator {
    pub fn new() -> Coordinator {
        Coordinator::default()
    }

    /// Called once per explorer before it touches the grid.
    pub fn start(&self) {
        let _ = self.started.fetch_add(1, Ordering::Relaxed);
        let now_active = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(now_active, "explorer started");
    }

    /// Called once per explorer at the very end of its cleanup.
    pub fn finish(&self) {
        let previously_active = self.active.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previously_active > 0, "finish without a matching start");
        if previously_active == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Raise the termination flag. Only the caller that actually raised it gets `true`.
    pub fn signal_exit_found(&self) -> bool {
        self.exit_found.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    #[inline]
    pub fn is_exit_found(&self) -> bool {
        self.exit_found.load(Ordering::Acquire)
    }

    #[inline]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// How many explorers were ever started during the run.
    #[inline]
    pub fn started(&self) -> usize {
        self.started.load(Ordering::Relaxed)
    }

    /// Wait until no explorer is live.
    pub async fn wait_idle(&self) {
        loop {
            // Register interest before checking the counter so a `finish` racing with the check
            // is not missed.
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn state(&self) -> RunState {
        if self.is_exit_found() {
            RunState::ExitFound
        } else if self.active() == 0 && self.started() > 0 {
            RunState::Exhausted
        } else {
            RunState::Running
        }
    }
}
