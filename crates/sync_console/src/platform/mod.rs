//! Host side of the sync console: configuration, logging, the event loop and
//! the bridge between core effects and the engine.
mod app;
mod config;
mod effects;
mod logging;
mod render;

pub use app::run_app;
