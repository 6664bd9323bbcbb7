//! Test infrastructure for the persistence layer.
//!
//! Provides configuration fixtures, seed helpers, and a fault-injecting store
//! wrapper shared by the integration tests.

#![allow(dead_code)]

pub mod faults;
pub mod fixtures;

pub use faults::*;
pub use fixtures::*;
