//! Document store backend implementations.
//!
//! This module contains implementations of the store traits for the supported
//! backends. The in-memory backend is always compiled; production backends are
//! gated behind feature flags.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | (always) | In-process store emulating document-store semantics, used for tests |
//! | MongoDB | `mongodb` | Production document store via the official driver |
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "mongodb")]
//! use movinin_persistence::backends::mongodb::MongoConnector;
//! use movinin_persistence::core::{ConnectOptions, Connector};
//!
//! # #[cfg(feature = "mongodb")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = MongoConnector::new();
//! let store = connector
//!     .connect("mongodb://127.0.0.1:27017/movinin", &ConnectOptions::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod memory;

#[cfg(feature = "mongodb")]
pub mod mongodb;
