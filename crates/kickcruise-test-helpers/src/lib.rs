//! Shared test utilities for KickCruise.
//!
//! Provides ride scripting (deterministic sample sequences with monotonic
//! timestamps) and mock collaborators, so scenario tests across the
//! workspace read as rides instead of as sample bookkeeping.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! kickcruise-test-helpers = { workspace = true }
//! ```
//!
//! ```
//! use kickcruise_test_helpers::prelude::*;
//!
//! let ride = Ride::at_tick_ms(50)
//!     .steady(10.0, 5)
//!     .kick_to(14.0)
//!     .steady(14.0, 20)
//!     .samples();
//! assert_eq!(ride.len(), 26);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

pub mod mock;
pub mod prelude;
pub mod ride;

pub use mock::{RecordingIndicator, RecordingSink, ScriptedSource};
pub use ride::Ride;
