//! Scheduling rules, list ranking and view mapping for events.
//!
//! Everything here is synchronous and takes the current time as an explicit
//! argument; the stores and services supply it.

pub mod clock;
pub mod error;
pub mod query;
pub mod rules;
pub mod view;

