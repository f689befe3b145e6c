//! Wire schema for the session context
//!
//! This module defines the telemetry event log format and the explicit
//! `SessionContext` that carries every externally sourced input into the engine.

mod context;
mod event;
pub mod timestamp;

pub use context::*;
pub use event::*;
