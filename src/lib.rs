//! framesmith - profile-driven batch video transcoding
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod pipeline;
pub mod scaffold;
pub mod scanner;
