//! HTTP API handlers
//!
//! Exposes the song search capability, health, settings and the event stream.

pub mod health;
pub mod settings;
pub mod songs;
pub mod sse;

pub use health::health_routes;
pub use settings::settings_routes;
pub use songs::song_routes;
pub use sse::event_routes;
