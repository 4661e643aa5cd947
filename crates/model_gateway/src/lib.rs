#![deny(unused)]
//! Model gateway for the Webs gateway.
//!
//! This crate provides:
//! - Table-driven wire formats for each backend request shape
//! - An HTTP provider adapter with explicit per-attempt timeouts
//! - The ordered fallback chain over configured providers

pub mod config;
pub mod providers;
pub mod selector;
pub mod wire;

pub use config::ProviderTable;
pub use providers::HttpProvider;
pub use selector::{FallbackChain, ProviderReply};
pub use wire::{wire_format, GeminiGenerateFormat, OpenAiChatFormat, WireFormat};
