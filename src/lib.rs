//! Rotation and retention of dated backup archives.
//!
//! [`core`](crate::core) holds the pure retention logic: parse a policy, list archives,
//! decide what to keep. [`app`](crate::app) wires it to the CLI, config file and logging.

pub mod app;
pub mod cli;
pub mod core;
pub mod utils;
