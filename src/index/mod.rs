//! User index module
//!
//! A JSON file recording, per user, what the last runs fetched and where it
//! went. Nothing reads it back during a sync; it exists for people and for
//! the `status` command.

mod user_index;

pub use user_index::{IndexFile, UserIndex, UserIndexEntry};
