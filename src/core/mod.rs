//! Engine, shared types and output writers.

pub mod engine;
pub mod error;
pub mod output;
pub mod snapshot;
pub mod time;
pub mod types;
