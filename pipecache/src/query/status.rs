//! Query cache status values and the derived UI state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Build state reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    /// No cache has been built.
    NotBuilt,
    /// A build job is running.
    Building,
    /// A cache exists.
    Cached,
    /// The last build job failed.
    Failed,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBuilt => write!(f, "NOT_BUILT"),
            Self::Building => write!(f, "BUILDING"),
            Self::Cached => write!(f, "CACHED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Freshness of a materialized query dataset cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCacheStatus {
    /// Whether the cache still matches its source definition.
    #[serde(default)]
    pub is_fresh: bool,
    /// The build state.
    pub build_status: BuildStatus,
    /// Human-readable detail from the service.
    #[serde(default)]
    pub message: String,
}

impl QueryCacheStatus {
    /// Creates a status.
    #[must_use]
    pub fn new(is_fresh: bool, build_status: BuildStatus) -> Self {
        Self {
            is_fresh,
            build_status,
            message: String::new(),
        }
    }

    /// A fresh, built cache.
    #[must_use]
    pub fn fresh() -> Self {
        Self::new(true, BuildStatus::Cached)
    }

    /// A built cache that no longer matches its query.
    #[must_use]
    pub fn stale() -> Self {
        Self::new(false, BuildStatus::Cached)
    }

    /// A build in progress.
    #[must_use]
    pub fn building() -> Self {
        Self::new(false, BuildStatus::Building)
    }

    /// No cache built yet.
    #[must_use]
    pub fn not_built() -> Self {
        Self::new(false, BuildStatus::NotBuilt)
    }

    /// A failed build.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(false, BuildStatus::Failed).with_message(message)
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// The state presented for a tracked query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryCacheState {
    /// A just-created query that has never been queried.
    New,
    /// Built and matching its query.
    Fresh,
    /// Built but out of date.
    Stale,
    /// A build job is running.
    Building,
    /// Never built.
    NotBuilt,
    /// The last build failed.
    Failed,
}

impl QueryCacheState {
    /// Maps a service status to a state.
    #[must_use]
    pub fn from_status(status: &QueryCacheStatus) -> Self {
        match status.build_status {
            BuildStatus::Cached if status.is_fresh => Self::Fresh,
            BuildStatus::Cached => Self::Stale,
            BuildStatus::Building => Self::Building,
            BuildStatus::NotBuilt => Self::NotBuilt,
            BuildStatus::Failed => Self::Failed,
        }
    }

    /// Returns true if a rebuild may be requested.
    #[must_use]
    pub fn can_rebuild(&self) -> bool {
        !matches!(self, Self::Building)
    }

    /// Returns true if the state may be dismissed.
    #[must_use]
    pub fn can_dismiss(&self) -> bool {
        matches!(self, Self::Fresh | Self::Stale | Self::NotBuilt)
    }

    /// Returns true if the status must be polled.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        matches!(self, Self::Building)
    }

    /// Returns true for states that need explicit user action to change.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Fresh | Self::Failed)
    }

    /// Returns the actions enabled in this state.
    #[must_use]
    pub fn actions(&self) -> QueryActions {
        QueryActions {
            rebuild: self.can_rebuild(),
            dismiss: self.can_dismiss(),
        }
    }

    /// Returns true if the action is enabled in this state.
    #[must_use]
    pub fn allows(&self, action: QueryAction) -> bool {
        match action {
            QueryAction::Rebuild => self.can_rebuild(),
            QueryAction::Dismiss => self.can_dismiss(),
        }
    }
}

impl fmt::Display for QueryCacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Fresh => write!(f, "FRESH"),
            Self::Stale => write!(f, "STALE"),
            Self::Building => write!(f, "BUILDING"),
            Self::NotBuilt => write!(f, "NOT_BUILT"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// A user action on the query cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryAction {
    /// Request a new cache build.
    Rebuild,
    /// Acknowledge the current state.
    Dismiss,
}

impl fmt::Display for QueryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rebuild => write!(f, "rebuild"),
            Self::Dismiss => write!(f, "dismiss"),
        }
    }
}

/// Which actions the presentation layer should enable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryActions {
    /// Rebuild is enabled.
    pub rebuild: bool,
    /// Dismiss is enabled.
    pub dismiss: bool,
}
