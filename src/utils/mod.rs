//! Utility functions and helpers
//!
//! Atomic file writes for the credential store.

pub mod atomic;

pub use atomic::{atomic_write, cleanup_temp_files, AtomicError};
