//! Remote karaoke catalog adapter core
//!
//! - `client` - bulk and per-song HTTP fetches
//! - `snapshot` - catalog records from the one bulk fetch, readiness latch
//! - `cache` - song identifier → resolved entry
//! - `resolver` - fetch, store, parse and enrich one record
//! - `search` - query the snapshot and resolve matches
//! - `song` / `parser` - external parser boundary and a header-only parser

pub mod cache;
pub mod client;
pub mod parser;
pub mod resolver;
pub mod search;
pub mod snapshot;
pub mod song;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::ResolutionCache;
pub use client::{CatalogClient, CatalogClientError, HttpCatalogClient};
pub use parser::HeaderParser;
pub use resolver::{ResolutionState, ResolveError, Resolver};
pub use search::SearchEngine;
pub use snapshot::{CatalogSnapshot, RawCatalogEntry, SnapshotError};
pub use song::{IssueSeverity, ParseError, ParsedSong, ResolvedEntry, SongIssue, SongMeta, SongParser};
