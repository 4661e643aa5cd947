#![deny(unused)]
//! HTTP gateway for Webs.
//!
//! This crate provides the HTTP entry point for the system: the identity
//! intent matcher, the response cache, and the orchestrator that ties them
//! to the session store and the provider fallback chain.

pub mod cache;
pub mod doctor;
pub mod intent;
pub mod orchestrator;
pub mod server;

pub use cache::{spawn_cache_sweeper, CacheStats, InMemoryResponseCache};
pub use intent::{normalize, similarity, PhraseIntentMatcher};
pub use orchestrator::{ChatOrchestrator, ChatOrchestratorBuilder};
pub use server::{AppState, GatewayConfig, GatewayServer};
