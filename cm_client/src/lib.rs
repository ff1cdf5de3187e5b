//! Terminal client for the class marketplace.
//!
//! Command parsing, the page state machine driving the library views, and
//! the line and TUI front ends used by the `cm_client` binary.

pub mod app;
pub mod commands;
pub mod files;
pub mod logging;
pub mod render;
pub mod repl;
pub mod tui_app;
