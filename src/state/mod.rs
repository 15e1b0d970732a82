//! State management module
//!
//! Persists pagination progress between runs so a traversal can resume
//! from its last committed page.
//!
//! # Overview
//!
//! The state module provides:
//! - `Checkpoint` - saved `PaginationState` tagged with its endpoint
//! - `StateManager` - file-based persistence with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{Checkpoint, CHECKPOINT_VERSION};
