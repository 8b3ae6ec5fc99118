//! Event types for the adapter event system
//!
//! Events replace the host notification hooks: the catalog lifecycle and
//! per-song resolution outcomes are broadcast to any subscriber (SSE clients,
//! tests, an embedding host).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Adapter event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AdapterEvent {
    /// Bulk catalog fetch completed and the snapshot is ready
    CatalogLoaded {
        song_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Bulk catalog fetch or deserialization failed; search stays empty for the session
    CatalogLoadFailed {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A catalog record was resolved and cached
    SongResolved {
        song_id: String,
        artist: String,
        title: String,
        issue_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A catalog record could not be resolved on this attempt
    SongResolutionFailed {
        song_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Adapter was unloaded
    AdapterUnloaded { timestamp: DateTime<Utc> },
}

impl AdapterEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            AdapterEvent::CatalogLoaded { .. } => "CatalogLoaded",
            AdapterEvent::CatalogLoadFailed { .. } => "CatalogLoadFailed",
            AdapterEvent::SongResolved { .. } => "SongResolved",
            AdapterEvent::SongResolutionFailed { .. } => "SongResolutionFailed",
            AdapterEvent::AdapterUnloaded { .. } => "AdapterUnloaded",
        }
    }
}

/// Broadcast bus for [`AdapterEvent`]s
///
/// Cloning is cheap; all clones share one channel.
///
/// # Examples
///
/// ```
/// use kpa_common::events::{AdapterEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(AdapterEvent::AdapterUnloaded {
///     timestamp: chrono::Utc::now(),
/// });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AdapterEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before slow receivers start lagging
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: AdapterEvent,
    ) -> Result<usize, broadcast::error::SendError<AdapterEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AdapterEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
