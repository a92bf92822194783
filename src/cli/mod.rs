//! Command-line surface: flags, config resolution and command dispatch.

pub mod commands;
pub mod config;
pub mod flags;
