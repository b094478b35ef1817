//! Query cache events for observability.
//!
//! The poller reports every transition and every surfaced failure to an
//! [`EventSink`]. The default sink discards them.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use crate::query::{QueryCacheState, QueryId};
use serde_json::json;

/// Something that happened to a tracked query cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// The presented state changed.
    StateChanged {
        /// The tracked query.
        query_id: QueryId,
        /// The previous state.
        from: QueryCacheState,
        /// The new state.
        to: QueryCacheState,
    },
    /// A build request is about to be sent.
    BuildRequested {
        /// The tracked query.
        query_id: QueryId,
    },
    /// A build request failed; the state was left unchanged.
    BuildFailed {
        /// The tracked query.
        query_id: QueryId,
        /// The failure message.
        error: String,
    },
    /// A caller-initiated status fetch failed; the state was left unchanged.
    StatusFetchFailed {
        /// The tracked query.
        query_id: QueryId,
        /// The failure message.
        error: String,
    },
    /// A background poll tick failed to fetch the status.
    PollFailed {
        /// The tracked query.
        query_id: QueryId,
        /// The failure message.
        error: String,
    },
    /// The user acknowledged the current state.
    Dismissed {
        /// The tracked query.
        query_id: QueryId,
        /// The acknowledged state.
        state: QueryCacheState,
    },
    /// Tracking was torn down.
    Closed {
        /// The tracked query.
        query_id: QueryId,
    },
}

impl CacheEvent {
    /// Returns the dotted event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "query_cache.state_changed",
            Self::BuildRequested { .. } => "query_cache.build_requested",
            Self::BuildFailed { .. } => "query_cache.build_failed",
            Self::StatusFetchFailed { .. } => "query_cache.status_fetch_failed",
            Self::PollFailed { .. } => "query_cache.poll_failed",
            Self::Dismissed { .. } => "query_cache.dismissed",
            Self::Closed { .. } => "query_cache.closed",
        }
    }

    /// Returns the tracked query.
    #[must_use]
    pub fn query_id(&self) -> QueryId {
        match self {
            Self::StateChanged { query_id, .. }
            | Self::BuildRequested { query_id }
            | Self::BuildFailed { query_id, .. }
            | Self::StatusFetchFailed { query_id, .. }
            | Self::PollFailed { query_id, .. }
            | Self::Dismissed { query_id, .. }
            | Self::Closed { query_id } => *query_id,
        }
    }

    /// Converts the event payload to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::StateChanged { query_id, from, to } => {
                json!({"query_id": query_id, "from": from, "to": to})
            }
            Self::BuildFailed { query_id, error }
            | Self::StatusFetchFailed { query_id, error }
            | Self::PollFailed { query_id, error } => {
                json!({"query_id": query_id, "error": error})
            }
            Self::Dismissed { query_id, state } => json!({"query_id": query_id, "state": state}),
            Self::BuildRequested { query_id } | Self::Closed { query_id } => {
                json!({"query_id": query_id})
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_changed_json() {
        let query_id = QueryId::new();
        let event = CacheEvent::StateChanged {
            query_id,
            from: QueryCacheState::Building,
            to: QueryCacheState::Fresh,
        };

        let data = event.to_json();
        assert_eq!(data["from"], "BUILDING");
        assert_eq!(data["to"], "FRESH");
        assert_eq!(data["query_id"], query_id.to_string());
        assert_eq!(event.query_id(), query_id);
    }

    #[test]
    fn test_event_types() {
        let query_id = QueryId::new();
        assert_eq!(
            CacheEvent::PollFailed { query_id, error: "timeout".into() }.event_type(),
            "query_cache.poll_failed"
        );
        assert_eq!(
            CacheEvent::Dismissed { query_id, state: QueryCacheState::Stale }.event_type(),
            "query_cache.dismissed"
        );
    }
}
