//! Shared configuration, errors, and small utilities for the almanac workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod util;
