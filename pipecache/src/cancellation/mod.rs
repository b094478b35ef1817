//! Structured cancellation utilities.
//!
//! This module provides:
//! - CancellationToken for cooperative cancellation
//! - TaskLease for scoped ownership of a spawned task

mod lease;
mod token;

pub use lease::TaskLease;
pub use token::CancellationToken;
