//! # Parley Common Library
//!
//! Shared code for the Parley discussion-session services including:
//! - Database initialization, schema, and entity models
//! - Event types (SessionEvent enum) and the broadcast EventBus
//! - Error taxonomy shared by all operations
//! - Configuration loading and data-directory resolution

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
