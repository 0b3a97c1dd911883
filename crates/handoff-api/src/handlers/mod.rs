//! HTTP handlers for the handoff endpoints.

mod verify;

pub use verify::verify_handler;
