//! Freshness tracking for one query's dataset cache.
//!
//! The poller maps service status to a [`QueryCacheState`], exposes the
//! Rebuild and Dismiss actions, and polls the service every
//! [`POLL_INTERVAL`] while a build is running. The poll task is held by a
//! [`TaskLease`]: it exists only while the state is `BUILDING` and is released
//! on every other transition and on teardown.

use super::{QueryAction, QueryActions, QueryCacheService, QueryCacheState, QueryCacheStatus, QueryId};
use crate::cancellation::{CancellationToken, TaskLease};
use crate::errors::PipecacheError;
use crate::events::{CacheEvent, EventSink, NoOpEventSink};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Interval between status fetches while a build is running.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Callback invoked when the user dismisses the current state.
pub type DismissHandler = Box<dyn Fn(&QueryId, QueryCacheState) + Send + Sync>;

/// Point-in-time view of a tracked query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCacheSnapshot {
    /// The tracked query.
    pub query_id: QueryId,
    /// The presented state.
    pub state: QueryCacheState,
    /// The last status reported by the service, if any.
    pub status: Option<QueryCacheStatus>,
    /// When the state was last written.
    pub updated_at: DateTime<Utc>,
}

impl QueryCacheSnapshot {
    /// Returns the actions enabled in the current state.
    #[must_use]
    pub fn actions(&self) -> QueryActions {
        self.state.actions()
    }
}

struct Shared {
    query_id: QueryId,
    service: Arc<dyn QueryCacheService>,
    sink: Arc<dyn EventSink>,
    dismiss_handler: Option<DismissHandler>,
    current: RwLock<QueryCacheSnapshot>,
    state_tx: watch::Sender<QueryCacheState>,
    poll: Mutex<Option<TaskLease>>,
    build_in_flight: AtomicBool,
    closed: CancellationToken,
}

impl Shared {
    fn state(&self) -> QueryCacheState {
        self.current.read().state
    }

    fn ensure_open(&self) -> Result<(), PipecacheError> {
        if self.closed.is_cancelled() {
            return Err(PipecacheError::Closed {
                query_id: self.query_id,
            });
        }
        Ok(())
    }

    /// Writes a new state and acquires or releases the poll lease to match.
    fn transition(
        self: &Arc<Self>,
        next: QueryCacheState,
        status: Option<QueryCacheStatus>,
    ) -> Result<QueryCacheState, PipecacheError> {
        self.ensure_open()?;

        let previous = {
            let mut current = self.current.write();
            let previous = current.state;
            current.state = next;
            current.status = status;
            current.updated_at = Utc::now();
            previous
        };
        self.state_tx.send_replace(next);

        if next.is_polling() {
            self.start_polling();
        } else {
            self.stop_polling();
        }

        if previous != next {
            info!(query_id = %self.query_id, from = %previous, to = %next, "query cache state changed");
            self.sink.try_emit(&CacheEvent::StateChanged {
                query_id: self.query_id,
                from: previous,
                to: next,
            });
        }
        Ok(next)
    }

    fn apply_status(self: &Arc<Self>, status: QueryCacheStatus) -> Result<QueryCacheState, PipecacheError> {
        let next = QueryCacheState::from_status(&status);
        self.transition(next, Some(status))
    }

    fn start_polling(self: &Arc<Self>) {
        let mut slot = self.poll.lock();
        // Checked under the lock so a concurrent close cannot leave a lease behind.
        if self.closed.is_cancelled() || slot.as_ref().is_some_and(TaskLease::is_active) {
            return;
        }

        debug!(query_id = %self.query_id, "starting status poll");
        let shared = Arc::clone(self);
        *slot = Some(TaskLease::spawn(
            format!("query-cache-poll:{}", self.query_id),
            move |token| shared.poll_loop(token),
        ));
    }

    fn stop_polling(&self) {
        let lease = self.poll.lock().take();
        if let Some(lease) = lease {
            debug!(query_id = %self.query_id, "stopping status poll");
            lease.release("left BUILDING");
        }
    }

    async fn poll_loop(self: Arc<Self>, token: Arc<CancellationToken>) {
        let mut ticker = interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = self.service.fetch_status(&self.query_id).await;
            if token.is_cancelled() {
                break;
            }

            match result {
                Ok(status) => match self.apply_status(status) {
                    Ok(state) if state.is_polling() => {}
                    _ => break,
                },
                Err(e) => {
                    // Transient while building; the next tick fetches again.
                    warn!(query_id = %self.query_id, error = %e, "status poll failed");
                    self.sink.try_emit(&CacheEvent::PollFailed {
                        query_id: self.query_id,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    fn close(&self) {
        if !self.closed.cancel("poller closed") {
            return;
        }
        self.stop_polling();
        debug!(query_id = %self.query_id, "query cache tracking closed");
        self.sink.try_emit(&CacheEvent::Closed {
            query_id: self.query_id,
        });
    }
}

/// Resets the in-flight build flag on every exit path.
struct BuildInFlight<'a>(&'a AtomicBool);

impl<'a> BuildInFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BuildInFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Builder for [`QueryCacheStatusPoller`].
pub struct QueryCacheStatusPollerBuilder {
    query_id: QueryId,
    service: Arc<dyn QueryCacheService>,
    sink: Arc<dyn EventSink>,
    dismiss_handler: Option<DismissHandler>,
}

impl QueryCacheStatusPollerBuilder {
    /// Sets the event sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the acknowledgement callback invoked by Dismiss.
    #[must_use]
    pub fn on_dismiss<F>(mut self, handler: F) -> Self
    where
        F: Fn(&QueryId, QueryCacheState) + Send + Sync + 'static,
    {
        self.dismiss_handler = Some(Box::new(handler));
        self
    }

    /// Builds the poller in the `NEW` state.
    #[must_use]
    pub fn build(self) -> QueryCacheStatusPoller {
        let (state_tx, _) = watch::channel(QueryCacheState::New);
        QueryCacheStatusPoller {
            shared: Arc::new(Shared {
                query_id: self.query_id,
                service: self.service,
                sink: self.sink,
                dismiss_handler: self.dismiss_handler,
                current: RwLock::new(QueryCacheSnapshot {
                    query_id: self.query_id,
                    state: QueryCacheState::New,
                    status: None,
                    updated_at: Utc::now(),
                }),
                state_tx,
                poll: Mutex::new(None),
                build_in_flight: AtomicBool::new(false),
                closed: CancellationToken::new(),
            }),
        }
    }
}

/// Tracks the freshness of one query's dataset cache.
///
/// Owned by whatever context shows the query. Dropping it (or calling
/// [`close`](Self::close)) cancels polling and discards results of calls still
/// in flight.
pub struct QueryCacheStatusPoller {
    shared: Arc<Shared>,
}

impl QueryCacheStatusPoller {
    /// Creates a poller with no event sink and no dismiss handler.
    #[must_use]
    pub fn new(query_id: QueryId, service: Arc<dyn QueryCacheService>) -> Self {
        Self::builder(query_id, service).build()
    }

    /// Starts building a poller.
    #[must_use]
    pub fn builder(query_id: QueryId, service: Arc<dyn QueryCacheService>) -> QueryCacheStatusPollerBuilder {
        QueryCacheStatusPollerBuilder {
            query_id,
            service,
            sink: Arc::new(NoOpEventSink),
            dismiss_handler: None,
        }
    }

    /// Returns the tracked query.
    #[must_use]
    pub fn query_id(&self) -> QueryId {
        self.shared.query_id
    }

    /// Returns the presented state.
    #[must_use]
    pub fn state(&self) -> QueryCacheState {
        self.shared.state()
    }

    /// Returns the actions enabled in the current state.
    ///
    /// Rebuild is also disabled while a build request is in flight.
    #[must_use]
    pub fn actions(&self) -> QueryActions {
        let mut actions = self.state().actions();
        if self.shared.build_in_flight.load(Ordering::SeqCst) {
            actions.rebuild = false;
        }
        actions
    }

    /// Returns a point-in-time view of the tracked query.
    #[must_use]
    pub fn snapshot(&self) -> QueryCacheSnapshot {
        self.shared.current.read().clone()
    }

    /// Returns true while the poll task is running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.shared
            .poll
            .lock()
            .as_ref()
            .is_some_and(TaskLease::is_active)
    }

    /// Returns true once tracking has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QueryCacheState> {
        self.shared.state_tx.subscribe()
    }

    /// Enters tracking when the query screen opens.
    ///
    /// A just-created query that has never been queried stays `NEW` without
    /// contacting the service. Otherwise the status is fetched.
    pub async fn open(&self, is_new: bool) -> Result<QueryCacheState, PipecacheError> {
        if is_new {
            return self.shared.transition(QueryCacheState::New, None);
        }
        self.refresh().await
    }

    /// Fetches the status and moves to the state it maps to.
    ///
    /// On failure the state is left unchanged and the error is returned.
    pub async fn refresh(&self) -> Result<QueryCacheState, PipecacheError> {
        self.shared.ensure_open()?;

        let query_id = self.shared.query_id;
        let status = match self.shared.service.fetch_status(&query_id).await {
            Ok(status) => status,
            Err(source) => {
                warn!(query_id = %query_id, error = %source, "status fetch failed");
                self.shared.sink.try_emit(&CacheEvent::StatusFetchFailed {
                    query_id,
                    error: source.to_string(),
                });
                return Err(PipecacheError::StatusFetch { query_id, source });
            }
        };

        self.shared.apply_status(status)
    }

    /// Requests a cache build and starts polling.
    ///
    /// Not available while `BUILDING` or while another build request is in
    /// flight. A failed request leaves the state unchanged.
    pub async fn rebuild(&self) -> Result<QueryCacheState, PipecacheError> {
        self.shared.ensure_open()?;

        let state = self.state();
        if !state.can_rebuild() {
            return Err(PipecacheError::action_unavailable(QueryAction::Rebuild, state));
        }
        let Some(_in_flight) = BuildInFlight::acquire(&self.shared.build_in_flight) else {
            return Err(PipecacheError::action_unavailable(QueryAction::Rebuild, state));
        };

        let query_id = self.shared.query_id;
        self.shared
            .sink
            .try_emit(&CacheEvent::BuildRequested { query_id });

        if let Err(source) = self.shared.service.request_build(&query_id).await {
            warn!(query_id = %query_id, error = %source, "build request failed");
            self.shared.sink.try_emit(&CacheEvent::BuildFailed {
                query_id,
                error: source.to_string(),
            });
            return Err(PipecacheError::BuildRequest { query_id, source });
        }

        // The service has not reported anything new; keep its last status.
        let last_status = self.shared.current.read().status.clone();
        self.shared.transition(QueryCacheState::Building, last_status)
    }

    /// Acknowledges the current state through the dismiss handler.
    ///
    /// Only available in `FRESH`, `STALE` and `NOT_BUILT`. Does not change the
    /// state or anything on the service.
    pub fn dismiss(&self) -> Result<(), PipecacheError> {
        self.shared.ensure_open()?;

        let state = self.state();
        if !state.can_dismiss() {
            return Err(PipecacheError::action_unavailable(QueryAction::Dismiss, state));
        }

        let query_id = self.shared.query_id;
        if let Some(handler) = &self.shared.dismiss_handler {
            handler(&query_id, state);
        }
        self.shared
            .sink
            .try_emit(&CacheEvent::Dismissed { query_id, state });
        Ok(())
    }

    /// Tears down tracking. Idempotent.
    pub fn close(&self) {
        self.shared.close();
    }
}

impl Drop for QueryCacheStatusPoller {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl std::fmt::Debug for QueryCacheStatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCacheStatusPoller")
            .field("query_id", &self.shared.query_id)
            .field("state", &self.state())
            .field("polling", &self.is_polling())
            .field("closed", &self.is_closed())
            .finish()
    }
}
