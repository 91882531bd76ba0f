//! Terminal front-end: configuration, logging, effect execution and rendering.
mod app;
mod config;
mod effects;
mod logging;
mod ui;

pub use app::run_app;
