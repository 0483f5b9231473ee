//! Database access layer for parley-sc
//!
//! One module per entity table. Every function takes a `&mut
//! SqliteConnection` so callers decide the transaction scope; multi-step
//! mutations in `services` always run inside a single transaction.

pub mod completions;
pub mod participants;
pub mod promotions;
pub mod questions;
pub mod ready;
pub mod scores;
pub mod sessions;
pub mod students;
pub mod tokens;
pub mod venues;
