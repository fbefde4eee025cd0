/// Worker state definitions for termination detection
///
/// A crawl is finished when every worker has observed an empty frontier at the
/// same time. Each worker publishes its own state into a shared table.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Represents the current state of a crawl worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Worker holds (or is about to take) an item from the frontier
    Running,

    /// Worker observed an empty frontier
    Idle,
}

impl WorkerState {
    /// Returns true if this is the idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Converts the state to a short string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared table of worker states, one cell per worker
///
/// Cells are never removed for the lifetime of a crawl. A cell is written only by
/// the worker that owns it; every worker reads the whole table when deciding
/// whether to exit.
#[derive(Debug)]
pub struct WorkerStatusTable {
    idle: Vec<AtomicBool>,
}

impl WorkerStatusTable {
    /// Creates a table for `workers` workers, all starting as Running
    pub fn new(workers: usize) -> Self {
        Self {
            idle: (0..workers).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Publishes the state of the worker at `index`
    pub fn set(&self, index: usize, state: WorkerState) {
        if let Some(cell) = self.idle.get(index) {
            cell.store(state.is_idle(), Ordering::SeqCst);
        }
    }

    /// Reads the state of the worker at `index`
    pub fn get(&self, index: usize) -> Option<WorkerState> {
        self.idle.get(index).map(|cell| {
            if cell.load(Ordering::SeqCst) {
                WorkerState::Idle
            } else {
                WorkerState::Running
            }
        })
    }

    /// Returns true if every worker is idle
    pub fn all_idle(&self) -> bool {
        self.idle.iter().all(|cell| cell.load(Ordering::SeqCst))
    }

    /// Number of idle workers
    pub fn idle_count(&self) -> usize {
        self.idle
            .iter()
            .filter(|cell| cell.load(Ordering::SeqCst))
            .count()
    }

    /// Number of workers tracked
    pub fn len(&self) -> usize {
        self.idle.len()
    }

    /// Returns true if the table tracks no workers
    pub fn is_empty(&self) -> bool {
        self.idle.is_empty()
    }
}
