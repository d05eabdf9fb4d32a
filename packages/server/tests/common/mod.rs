//! Shared test infrastructure.
//!
//! Each suite gets an in-process harness: in-memory job/article stores plus
//! scripted text generators, wired together the same way the binaries wire
//! the Redis-backed production pieces.

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;
pub mod stubs;

pub use fixtures::*;
pub use harness::TestHarness;
pub use stubs::*;
