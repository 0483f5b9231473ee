//! Domain services for the session coordinator
//!
//! Every multi-step mutation here executes inside a single transaction;
//! counter mutations are conditional statements whose affected-row count is
//! checked, never separate read+write calls.

pub mod admission;
pub mod booking;
pub mod promotion;
pub mod ranking;
pub mod results;
pub mod scoring;
pub mod tokens;
