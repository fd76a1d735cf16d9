//! Pitchforge core: the dependency-gated task executor and the marketing
//! analysis pipeline built on top of it.

pub mod analysis;
pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod generators;
