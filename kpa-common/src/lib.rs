//! # Karaoke Provider Adapter Common Library
//!
//! Shared code for the adapter crates including:
//! - Error type
//! - TOML bootstrap configuration and root folder resolution
//! - Adapter event bus
//! - Server-Sent Events helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
