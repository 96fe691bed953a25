//! Utility functions for Arrow value handling and logging

pub mod arrow_utils;
pub mod logging;
