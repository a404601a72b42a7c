// The binary in main.rs drives the terminal demo; benches and integration
// tests use the same module tree through this library target.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod secure;
pub mod ui;
