//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for logging, console output, and progress tracking.

pub mod console;
pub mod log;
pub mod progress;

// Re-export commonly used functions for convenience
pub use self::log::{log_case_heading, log_matching_complete, log_matching_start};
pub use self::progress::{create_case_progress_bar, finish_progress_bar};
