//! Terminal dashboard: app state, charts, counter animation and the event loop.

pub mod animation;
pub mod app;
pub mod charts;
pub mod terminal;
