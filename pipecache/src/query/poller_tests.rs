//! State machine and polling tests for the query cache poller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_test::{assert_err, assert_ok};

use crate::errors::{PipecacheError, ServiceError};
use crate::events::{CacheEvent, CollectingEventSink};
use crate::query::{
    MockQueryCacheService, QueryActions, QueryCacheState, QueryCacheStatus, QueryCacheStatusPoller,
    QueryId, POLL_INTERVAL,
};
use crate::testing::{assert_poller_state, ScriptedQueryService};

const BOTH: QueryActions = QueryActions { rebuild: true, dismiss: true };
const REBUILD_ONLY: QueryActions = QueryActions { rebuild: true, dismiss: false };
const NONE: QueryActions = QueryActions { rebuild: false, dismiss: false };

fn poller_for(service: &Arc<ScriptedQueryService>) -> QueryCacheStatusPoller {
    QueryCacheStatusPoller::new(QueryId::new(), service.clone())
}

#[tokio::test(start_paused = true)]
async fn test_stale_cache_enables_both_actions() {
    let service = Arc::new(ScriptedQueryService::with_statuses([QueryCacheStatus::stale()]));
    let poller = poller_for(&service);

    let state = assert_ok!(poller.open(false).await);

    assert_eq!(state, QueryCacheState::Stale);
    assert_poller_state(&poller, QueryCacheState::Stale, BOTH);
    assert!(!poller.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_new_query_is_not_fetched() {
    let service = Arc::new(ScriptedQueryService::with_statuses([QueryCacheStatus::stale()]));
    let poller = poller_for(&service);

    assert_eq!(assert_ok!(poller.open(true).await), QueryCacheState::New);
    assert_poller_state(&poller, QueryCacheState::New, REBUILD_ONLY);
    assert_eq!(service.fetch_count(), 0);
    assert!(poller.snapshot().status.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_rebuild_polls_until_fresh() {
    let service = Arc::new(ScriptedQueryService::with_statuses([
        QueryCacheStatus::stale(),
        QueryCacheStatus::building(),
        QueryCacheStatus::building(),
        QueryCacheStatus::building(),
        QueryCacheStatus::fresh(),
    ]));
    let sink = Arc::new(CollectingEventSink::new());
    let poller = QueryCacheStatusPoller::builder(QueryId::new(), service.clone())
        .event_sink(sink.clone())
        .build();
    let mut states = poller.subscribe();

    assert_ok!(poller.open(false).await);
    assert_eq!(assert_ok!(poller.rebuild().await), QueryCacheState::Building);
    assert_poller_state(&poller, QueryCacheState::Building, NONE);
    assert!(poller.is_polling());

    tokio::time::sleep(POLL_INTERVAL * 3 + Duration::from_millis(1)).await;
    assert_eq!(service.fetch_count(), 4);
    assert_eq!(poller.state(), QueryCacheState::Building);

    assert_ok!(states.wait_for(|state| *state == QueryCacheState::Fresh).await);
    assert_poller_state(&poller, QueryCacheState::Fresh, BOTH);
    assert_eq!(service.fetch_count(), 5);
    assert_eq!(service.build_count(), 1);
    assert!(!poller.is_polling());

    tokio::time::sleep(POLL_INTERVAL * 4).await;
    assert_eq!(service.fetch_count(), 5);

    assert_eq!(
        sink.event_types(),
        vec![
            "query_cache.state_changed",
            "query_cache.build_requested",
            "query_cache.state_changed",
            "query_cache.state_changed",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_open_while_building_starts_polling() {
    let service = Arc::new(ScriptedQueryService::with_statuses([
        QueryCacheStatus::building(),
        QueryCacheStatus::failed("segmenter crashed"),
    ]));
    let poller = poller_for(&service);
    let mut states = poller.subscribe();

    assert_eq!(assert_ok!(poller.open(false).await), QueryCacheState::Building);
    assert!(poller.is_polling());

    assert_ok!(states.wait_for(|state| *state == QueryCacheState::Failed).await);
    assert_poller_state(&poller, QueryCacheState::Failed, REBUILD_ONLY);
    assert!(!poller.is_polling());
    assert_eq!(
        poller.snapshot().status.map(|s| s.message),
        Some("segmenter crashed".to_string())
    );

    tokio::time::sleep(POLL_INTERVAL * 3).await;
    assert_eq!(service.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_poll_reaching_not_built_stops_polling() {
    let service = Arc::new(ScriptedQueryService::with_statuses([
        QueryCacheStatus::building(),
        QueryCacheStatus::not_built(),
    ]));
    let poller = poller_for(&service);
    let mut states = poller.subscribe();

    assert_ok!(poller.open(false).await);
    assert_ok!(states.wait_for(|state| *state == QueryCacheState::NotBuilt).await);

    assert_poller_state(&poller, QueryCacheState::NotBuilt, BOTH);
    assert!(!poller.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_transient_poll_failures_keep_polling() {
    let service = Arc::new(ScriptedQueryService::with_statuses([QueryCacheStatus::stale()]));
    service.push_status(Err(ServiceError::transport("connection reset")));
    service.push_status(Err(ServiceError::transport("timeout")));
    service.push_status(Ok(QueryCacheStatus::fresh()));
    let sink = Arc::new(CollectingEventSink::new());
    let poller = QueryCacheStatusPoller::builder(QueryId::new(), service.clone())
        .event_sink(sink.clone())
        .build();
    let mut states = poller.subscribe();

    assert_ok!(poller.open(false).await);
    assert_ok!(poller.rebuild().await);

    tokio::time::sleep(POLL_INTERVAL * 2 + Duration::from_millis(1)).await;
    assert_eq!(poller.state(), QueryCacheState::Building);
    assert!(poller.is_polling());

    assert_ok!(states.wait_for(|state| *state == QueryCacheState::Fresh).await);
    assert_eq!(service.fetch_count(), 4);

    let poll_failures = sink
        .events()
        .into_iter()
        .filter(|event| matches!(event, CacheEvent::PollFailed { .. }))
        .count();
    assert_eq!(poll_failures, 2);
}

#[tokio::test(start_paused = true)]
async fn test_rebuild_failure_leaves_state_unchanged() {
    let mut service = MockQueryCacheService::new();
    service
        .expect_fetch_status()
        .times(1)
        .returning(|_| Ok(QueryCacheStatus::stale()));
    service
        .expect_request_build()
        .times(1)
        .returning(|_| Err(ServiceError::rejected("quota exceeded")));
    let poller = QueryCacheStatusPoller::new(QueryId::new(), Arc::new(service));

    assert_ok!(poller.open(false).await);
    let err = assert_err!(poller.rebuild().await);

    assert!(matches!(err, PipecacheError::BuildRequest { .. }));
    assert_poller_state(&poller, QueryCacheState::Stale, BOTH);
    assert!(!poller.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_rebuild_rejected_while_building() {
    let service = Arc::new(ScriptedQueryService::with_statuses([
        QueryCacheStatus::stale(),
        QueryCacheStatus::building(),
    ]));
    let poller = poller_for(&service);

    assert_ok!(poller.open(false).await);
    assert_ok!(poller.rebuild().await);
    let err = assert_err!(poller.rebuild().await);

    assert!(matches!(
        err,
        PipecacheError::ActionUnavailable { state: QueryCacheState::Building, .. }
    ));
    assert_eq!(service.build_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_surfaces_error() {
    let service = Arc::new(ScriptedQueryService::new());
    let sink = Arc::new(CollectingEventSink::new());
    let poller = QueryCacheStatusPoller::builder(QueryId::new(), service.clone())
        .event_sink(sink.clone())
        .build();

    let err = assert_err!(poller.open(false).await);

    assert!(matches!(err, PipecacheError::StatusFetch { .. }));
    assert_eq!(poller.state(), QueryCacheState::New);
    assert_eq!(sink.event_types(), vec!["query_cache.status_fetch_failed"]);
}

#[tokio::test(start_paused = true)]
async fn test_rebuild_keeps_last_service_status() {
    let service = Arc::new(ScriptedQueryService::with_statuses([
        QueryCacheStatus::stale().with_message("query changed"),
        QueryCacheStatus::building().with_message("job 42 running"),
    ]));
    let poller = poller_for(&service);

    assert_ok!(poller.open(false).await);
    assert_ok!(poller.rebuild().await);

    let snapshot = poller.snapshot();
    assert_eq!(snapshot.state, QueryCacheState::Building);
    assert_eq!(
        snapshot.status,
        Some(QueryCacheStatus::stale().with_message("query changed"))
    );

    tokio::time::sleep(POLL_INTERVAL + Duration::from_millis(1)).await;
    assert_eq!(
        poller.snapshot().status.map(|s| s.message),
        Some("job 42 running".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_invokes_handler_only_when_enabled() {
    let service = Arc::new(ScriptedQueryService::with_statuses([
        QueryCacheStatus::stale(),
        QueryCacheStatus::building(),
    ]));
    let acknowledged = Arc::new(AtomicUsize::new(0));
    let poller = {
        let acknowledged = Arc::clone(&acknowledged);
        QueryCacheStatusPoller::builder(QueryId::new(), service.clone())
            .on_dismiss(move |_query_id, state| {
                assert_eq!(state, QueryCacheState::Stale);
                acknowledged.fetch_add(1, Ordering::SeqCst);
            })
            .build()
    };

    assert_ok!(poller.open(false).await);
    assert_ok!(poller.dismiss());
    assert_eq!(acknowledged.load(Ordering::SeqCst), 1);
    assert_eq!(poller.state(), QueryCacheState::Stale);

    assert_ok!(poller.rebuild().await);
    let err = assert_err!(poller.dismiss());
    assert!(matches!(err, PipecacheError::ActionUnavailable { .. }));
    assert_eq!(acknowledged.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_rejected_when_failed() {
    let service = Arc::new(ScriptedQueryService::with_statuses([QueryCacheStatus::failed("oom")]));
    let poller = poller_for(&service);

    assert_ok!(poller.open(false).await);
    assert_err!(poller.dismiss());
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_polling_and_transitions() {
    let service = Arc::new(ScriptedQueryService::with_statuses([
        QueryCacheStatus::stale(),
        QueryCacheStatus::building(),
    ]));
    let poller = poller_for(&service);

    assert_ok!(poller.open(false).await);
    assert_ok!(poller.rebuild().await);
    tokio::time::sleep(POLL_INTERVAL + Duration::from_millis(1)).await;
    assert_eq!(service.fetch_count(), 2);

    poller.close();
    poller.close();
    assert!(poller.is_closed());
    assert!(!poller.is_polling());

    tokio::time::sleep(POLL_INTERVAL * 5).await;
    assert_eq!(service.fetch_count(), 2);
    assert_eq!(poller.state(), QueryCacheState::Building);

    let err = assert_err!(poller.refresh().await);
    assert!(matches!(err, PipecacheError::Closed { .. }));
    assert_err!(poller.dismiss());
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_poll_task() {
    let service = Arc::new(ScriptedQueryService::with_statuses([QueryCacheStatus::building()]));
    {
        let poller = poller_for(&service);
        assert_ok!(poller.open(false).await);
        assert!(poller.is_polling());
    }

    tokio::time::sleep(POLL_INTERVAL * 5).await;
    assert_eq!(service.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_while_building_does_not_duplicate_poll() {
    let service = Arc::new(ScriptedQueryService::with_statuses([
        QueryCacheStatus::building(),
        QueryCacheStatus::building(),
    ]));
    let poller = poller_for(&service);

    assert_ok!(poller.open(false).await);
    assert_ok!(poller.refresh().await);
    assert_eq!(service.fetch_count(), 2);

    tokio::time::sleep(POLL_INTERVAL * 2 + Duration::from_millis(1)).await;
    assert_eq!(service.fetch_count(), 4);
}
