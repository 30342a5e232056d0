//! End-to-end tests for projected modules
//!
//! These tests project class definitions, assemble them into an in-memory
//! store, and drive the facades before and after wiring.

mod harness;
mod accessors;
mod actions;
mod counter;
mod namespacing;
mod setup;
mod state;

pub use harness::*;
