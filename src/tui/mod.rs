//! Terminal User Interface module for lookout
//!
//! This module provides a keyboard-driven live view of a paused debuggee.
//! It connects to the debug bridge via WebSocket and displays threads, the
//! call stack, variables, object cards and the console.

mod app;
mod views;

pub use app::run_tui;
