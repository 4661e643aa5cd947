//! Core type definitions for the Webs gateway.
//!
//! Broken down into submodules: conversation state, inbound/outbound chat
//! payloads, and intent classification results.

pub mod chat;
pub mod intent;
pub mod session;

pub use chat::*;
pub use intent::*;
pub use session::*;
