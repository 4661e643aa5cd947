//! Core traits for the Webs gateway.
//!
//! Traits are organized by layer:
//! - `gateway`: request-path traits (IntentMatcher, ResponseCache)
//! - `store`: session state (SessionStore)
//! - `llm`: backend providers (ChatBackend)

pub mod gateway;
pub mod llm;
pub mod store;

pub use gateway::*;
pub use llm::*;
pub use store::*;
