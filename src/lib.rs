// Library surface for the binary and for headless/integration tests.
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod keymap;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod terminal;
pub mod ui;
