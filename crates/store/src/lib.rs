#![deny(unused)]
//! Session storage for the Webs gateway.
//!
//! Sessions live in process memory for the lifetime of the store object that
//! owns them. A retention task prunes idle sessions in the background.

pub mod memory;
pub mod retention;

pub use memory::InMemorySessionStore;
pub use retention::{spawn_pruner, RetentionPolicy};
