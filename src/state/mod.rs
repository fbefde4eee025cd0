//! State module for tracking worker liveness
//!
//! This module provides the state used by the crawl coordinator to decide when a
//! crawl is finished.
//!
//! # Components
//!
//! - `WorkerState`: Running or Idle, per worker
//! - `WorkerStatusTable`: one cell per worker, written by its owner and read by all

mod worker_state;

// Re-export main types
pub use worker_state::{WorkerState, WorkerStatusTable};
