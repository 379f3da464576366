//! Shared primitives for the streaming server fixture.
//!
//! ## Architecture
//!
//! - **common** (this crate): types every other crate leans on
//! - **fixture-core**: argument assembly and process ownership
//! - **stan-fixture**: binary wiring config, logging and the fixture together
//!
//! Nothing in here knows about processes; it only exists so that errors raised
//! in either crate report their call site the same way.

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
