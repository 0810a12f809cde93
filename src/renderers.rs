use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::grid::Snapshot;

/// Consumes grid snapshots for display. Explorers call `present` outside the grid lock, so
/// implementations must cope with concurrent calls.
pub trait PresentationSink: Send + Sync {
    fn present(&self, snapshot: &Snapshot);
}

/// Discards every snapshot.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn present(&self, _: &Snapshot) {}
}

/// Redraws the whole maze on stdout for every snapshot.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    // Serialises whole frames; stdout's own lock is per write call.
    frame_lock: Mutex<()>,
}

impl TerminalRenderer {
    pub fn new() -> TerminalRenderer {
        TerminalRenderer::default()
    }

    fn draw(&self, snapshot: &Snapshot) -> io::Result<()> {
        // ANSI: clear screen, cursor home.
        const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

        let frame = format!("{}{}", CLEAR_SCREEN, snapshot);
        let _frame_guard = self.frame_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(frame.as_bytes())?;
        out.flush()
    }
}

impl PresentationSink for TerminalRenderer {
    fn present(&self, snapshot: &Snapshot) {
        if let Err(e) = self.draw(snapshot) {
            warn!(error = %e, "failed to draw maze frame");
        }
    }
}

/// Keeps every snapshot it is given, in arrival order.
#[derive(Debug, Default)]
pub struct SnapshotRecorder {
    snapshots: Mutex<Vec<Snapshot>>,
}

impl SnapshotRecorder {
    pub fn new() -> SnapshotRecorder {
        SnapshotRecorder::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn take(&self) -> Vec<Snapshot> {
        let mut snapshots = self.snapshots.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *snapshots)
    }
}

impl PresentationSink for SnapshotRecorder {
    fn present(&self, snapshot: &Snapshot) {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
    }
}
