//! The periodic sync scheduler.
//!
//! Drives the cycle state machine (from nearby-core) on a fixed cadence
//! and interprets its actions: pull a fix from the LocationSource, upsert
//! it to the LocationStore, fetch all peers, evaluate proximity, and
//! dispatch deduplicated alerts. The current [`NearbySet`] and the last
//! cycle error are published on watch channels, so any number of
//! observers can render them without ever blocking the next cycle.
//!
//! One cycle at a time: the loop is a single sequential task, and missed
//! ticks are coalesced rather than queued.

use std::time::Duration;

use nearby_core::{
    cycle::{CycleAction, CycleEvent, CyclePhase, SchedulerEvent},
    evaluate, NotifiedSet,
};
use nearby_types::{Identity, NearbyError, NearbySet};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::dispatch::NotificationDispatcher;
use crate::source::LocationSource;
use crate::store::LocationStore;

/// Default proximity radius in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// Default cycle interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// The local participant's identity, supplied at session start.
    pub identity: Identity,
    /// Alert radius in meters.
    pub radius_meters: f64,
    /// Fixed cycle cadence.
    pub interval: Duration,
}

impl SchedulerConfig {
    /// Create a configuration with the default radius and interval.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            radius_meters: DEFAULT_RADIUS_METERS,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Set the alert radius.
    pub fn with_radius_meters(mut self, radius_meters: f64) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    /// Set the cycle interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// The periodic proximity sync scheduler.
///
/// Owns the session's [`NotifiedSet`] and the last-published
/// [`NearbySet`]; both are mutated only by this scheduler's own
/// sequential pipeline. Collaborators are constructor-injected so tests
/// can substitute deterministic fakes.
pub struct SyncScheduler<L, S, D> {
    config: SchedulerConfig,
    source: L,
    store: S,
    dispatcher: D,
    phase: CyclePhase,
    notified: NotifiedSet,
    nearby_tx: watch::Sender<NearbySet>,
    error_tx: watch::Sender<Option<NearbyError>>,
}

impl<L, S, D> SyncScheduler<L, S, D>
where
    L: LocationSource,
    S: LocationStore,
    D: NotificationDispatcher,
{
    /// Create a new scheduler. No cycles run until [`SyncScheduler::spawn`]
    /// (or [`SyncScheduler::run_cycle`] for manual stepping).
    pub fn new(config: SchedulerConfig, source: L, store: S, dispatcher: D) -> Self {
        let (nearby_tx, _) = watch::channel(NearbySet::new());
        let (error_tx, _) = watch::channel(None);
        Self {
            config,
            source,
            store,
            dispatcher,
            phase: CyclePhase::new(),
            notified: NotifiedSet::new(),
            nearby_tx,
            error_tx,
        }
    }

    /// Subscribe to the published nearby set.
    ///
    /// Each cycle replaces the value in full; the initial value is empty.
    pub fn subscribe(&self) -> watch::Receiver<NearbySet> {
        self.nearby_tx.subscribe()
    }

    /// Subscribe to the last cycle error (`None` after a clean cycle).
    pub fn last_error(&self) -> watch::Receiver<Option<NearbyError>> {
        self.error_tx.subscribe()
    }

    /// How many peers have alerted this session.
    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }

    /// Clear the session's notified set (explicit session reset).
    pub fn reset_session(&mut self) {
        self.notified.reset();
    }

    /// Run one full upload -> fetch -> evaluate -> notify pass.
    ///
    /// Public so tests and callers with their own cadence can step cycles
    /// deterministically. Feeds the pure state machine and executes the
    /// actions it returns; any store failure abandons the cycle, leaving
    /// the published set and the notified set untouched.
    pub async fn run_cycle(&mut self) {
        let mut pending = Some(CycleEvent::Tick {
            fix: self.source.current_fix(),
        });

        while let Some(event) = pending.take() {
            let (phase, actions) = self.phase.clone().on_event(event);
            self.phase = phase;

            for action in actions {
                match action {
                    CycleAction::Upload { fix } => {
                        let result = self
                            .store
                            .upsert(&self.config.identity, fix.latitude, fix.longitude)
                            .await;
                        pending = Some(match result {
                            Ok(()) => {
                                debug!(
                                    latitude = fix.latitude,
                                    longitude = fix.longitude,
                                    "uploaded local fix"
                                );
                                CycleEvent::UploadSucceeded
                            }
                            Err(e) => CycleEvent::UploadFailed { error: e.into() },
                        });
                    }
                    CycleAction::Fetch => {
                        pending = Some(match self.store.list().await {
                            Ok(peers) => CycleEvent::FetchSucceeded { peers },
                            Err(e) => CycleEvent::FetchFailed { error: e.into() },
                        });
                    }
                    CycleAction::Evaluate { fix, peers } => {
                        let nearby = evaluate(
                            &self.config.identity,
                            &fix,
                            &peers,
                            self.config.radius_meters,
                        );
                        debug!(total = peers.len(), nearby = nearby.len(), "evaluated peers");
                        pending = Some(CycleEvent::Evaluated { nearby });
                    }
                    CycleAction::PublishNearby { nearby } => {
                        self.nearby_tx.send_replace(nearby);
                    }
                    CycleAction::Notify { nearby } => {
                        for event in &nearby {
                            if !self.notified.should_alert(&event.identity) {
                                continue;
                            }
                            info!(
                                peer = %event.identity,
                                distance_meters = event.distance_meters,
                                "peer nearby, dispatching alert"
                            );
                            if let Err(e) = self.dispatcher.dispatch(&event.identity).await {
                                // At-most-once: the identity stays marked
                                // notified even when delivery fails.
                                let error = NearbyError::DispatchFailure(e.to_string());
                                warn!(peer = %event.identity, %error, "alert dispatch failed");
                            }
                        }
                        pending = Some(CycleEvent::NotifyCompleted);
                    }
                    CycleAction::CancelTick => {}
                    CycleAction::EmitEvent(event) => self.report(event),
                }
            }
        }
    }

    fn report(&self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::CycleDeferred => {
                debug!("no location fix available, deferring cycle");
                self.error_tx
                    .send_replace(Some(NearbyError::PermissionUnavailable));
            }
            SchedulerEvent::CycleFailed { error } => {
                warn!(%error, "sync cycle abandoned, retrying next tick");
                self.error_tx.send_replace(Some(error));
            }
            SchedulerEvent::CycleCompleted { nearby } => {
                debug!(nearby, "sync cycle completed");
                self.error_tx.send_replace(None);
            }
        }
    }

    /// Move the scheduler into a background task driven by a fixed-interval
    /// timer. Returns a handle for subscribing and stopping.
    pub fn spawn(mut self) -> SchedulerHandle
    where
        L: 'static,
        S: 'static,
        D: 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let nearby_rx = self.nearby_tx.subscribe();
        let error_rx = self.error_tx.subscribe();
        let interval = self.config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // A cycle that overruns its slot coalesces the missed ticks
            // instead of queueing a burst of catch-up cycles.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(interval_secs = interval.as_secs_f64(), "sync scheduler started");

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        // Stop cancels an in-flight cycle at its next await
                        // point; its results are discarded and the notified
                        // set keeps whatever progress it made.
                        tokio::select! {
                            _ = stop_rx.changed() => break,
                            _ = self.run_cycle() => {}
                        }
                    }
                }
            }

            let (phase, _) = self.phase.clone().on_event(CycleEvent::StopRequested);
            self.phase = phase;
            info!("sync scheduler stopped");
        });

        SchedulerHandle {
            stop: stop_tx,
            task,
            nearby_rx,
            error_rx,
        }
    }
}

/// Handle to a running scheduler task.
///
/// Dropping the handle also stops the scheduler (the stop channel closes).
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
    nearby_rx: watch::Receiver<NearbySet>,
    error_rx: watch::Receiver<Option<NearbyError>>,
}

impl SchedulerHandle {
    /// Subscribe to the published nearby set.
    pub fn subscribe(&self) -> watch::Receiver<NearbySet> {
        self.nearby_rx.clone()
    }

    /// Subscribe to the last cycle error.
    pub fn last_error(&self) -> watch::Receiver<Option<NearbyError>> {
        self.error_rx.clone()
    }

    /// Stop the scheduler: cancels the pending tick and waits for the task
    /// to wind down. No further cycles run after this returns.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }

    /// Whether the scheduler task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MockDispatcher;
    use crate::source::SharedLocationSource;
    use crate::store::{MockLocationStore, StoreError};
    use nearby_types::{LocationFix, PeerLocation};

    fn id(token: &str) -> Identity {
        Identity::new(token).unwrap()
    }

    fn me() -> Identity {
        id("me")
    }

    /// Scheduler wired to fresh mocks, radius 100 m.
    fn scheduler() -> (
        SyncScheduler<SharedLocationSource, MockLocationStore, MockDispatcher>,
        SharedLocationSource,
        MockLocationStore,
        MockDispatcher,
    ) {
        let source = SharedLocationSource::new();
        let store = MockLocationStore::new();
        let dispatcher = MockDispatcher::new();
        let config = SchedulerConfig::new(me()).with_radius_meters(100.0);
        let scheduler = SyncScheduler::new(config, source.clone(), store.clone(), dispatcher.clone());
        (scheduler, source, store, dispatcher)
    }

    fn local_fix() -> LocationFix {
        LocationFix::at(me(), 37.0, -122.0, 1_700_000_000)
    }

    /// ~55 m from the local fix.
    fn peer_in_range(token: &str) -> PeerLocation {
        PeerLocation::new(id(token), 37.0005, -122.0)
    }

    /// ~150 m from the local fix.
    fn peer_out_of_range(token: &str) -> PeerLocation {
        PeerLocation::new(id(token), 37.00135, -122.0)
    }

    // ===========================================
    // End-to-end cycle scenarios
    // ===========================================

    #[tokio::test]
    async fn coincident_peer_alerts_once_across_cycles() {
        // Scenario A: peer at the exact local coordinates, radius 100 m.
        let (mut scheduler, source, store, dispatcher) = scheduler();
        source.publish_fix(local_fix());
        store.set_peers(vec![PeerLocation::new(id("friend"), 37.0, -122.0)]);

        scheduler.run_cycle().await;

        let nearby = scheduler.subscribe().borrow().clone();
        assert!(nearby.contains(&id("friend")));
        assert_eq!(nearby.events()[0].distance_meters, 0.0);
        assert_eq!(dispatcher.dispatched(), vec![id("friend")]);

        // Second cycle: still nearby, but no second alert.
        scheduler.run_cycle().await;
        assert_eq!(dispatcher.dispatch_count(), 1);
        assert!(scheduler.subscribe().borrow().contains(&id("friend")));
    }

    #[tokio::test]
    async fn peer_beyond_radius_is_excluded() {
        // Scenario B: peer at ~150 m, radius 100 m.
        let (mut scheduler, source, store, dispatcher) = scheduler();
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_out_of_range("friend")]);

        scheduler.run_cycle().await;

        assert!(scheduler.subscribe().borrow().is_empty());
        assert_eq!(dispatcher.dispatch_count(), 0);
    }

    #[tokio::test]
    async fn leaving_and_returning_does_not_realert() {
        // Scenario C: enter, leave, re-enter.
        let (mut scheduler, source, store, dispatcher) = scheduler();
        source.publish_fix(local_fix());

        store.set_peers(vec![peer_in_range("friend")]);
        scheduler.run_cycle().await;
        assert_eq!(dispatcher.dispatch_count(), 1);

        store.set_peers(vec![peer_out_of_range("friend")]);
        scheduler.run_cycle().await;
        assert!(scheduler.subscribe().borrow().is_empty());

        store.set_peers(vec![peer_in_range("friend")]);
        scheduler.run_cycle().await;
        assert!(scheduler.subscribe().borrow().contains(&id("friend")));
        // NotifiedSet retains the identity across the gap.
        assert_eq!(dispatcher.dispatch_count(), 1);
    }

    #[tokio::test]
    async fn missing_fix_defers_cycle_entirely() {
        // Scenario D: no fix -> no upsert, no fetch, set unchanged.
        let (mut scheduler, source, store, _dispatcher) = scheduler();

        // Seed a published set with one successful cycle.
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_in_range("friend")]);
        scheduler.run_cycle().await;
        let before = scheduler.subscribe().borrow().clone();
        assert_eq!(before.len(), 1);
        let upserts_before = store.upserts().len();
        let lists_before = store.list_calls();

        // Fix disappears (e.g. permission revoked); snapshot also changes.
        source.clear_fix();
        store.set_peers(vec![]);
        scheduler.run_cycle().await;

        assert_eq!(store.upserts().len(), upserts_before);
        assert_eq!(store.list_calls(), lists_before);
        assert_eq!(*scheduler.subscribe().borrow(), before);
        assert_eq!(
            *scheduler.last_error().borrow(),
            Some(NearbyError::PermissionUnavailable)
        );
    }

    // ===========================================
    // Failure handling
    // ===========================================

    #[tokio::test]
    async fn upload_failure_abandons_cycle_before_fetch() {
        let (mut scheduler, source, store, dispatcher) = scheduler();
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_in_range("friend")]);
        store.fail_next_upsert(StoreError::Unreachable("connection refused".into()));

        scheduler.run_cycle().await;

        // Fail-fast: never fetched, never evaluated, nothing published.
        assert_eq!(store.list_calls(), 0);
        assert!(scheduler.subscribe().borrow().is_empty());
        assert_eq!(dispatcher.dispatch_count(), 0);
        assert_eq!(scheduler.notified_count(), 0);
        assert!(matches!(
            *scheduler.last_error().borrow(),
            Some(NearbyError::StoreUnreachable(_))
        ));

        // Next tick recovers.
        scheduler.run_cycle().await;
        assert_eq!(dispatcher.dispatch_count(), 1);
        assert_eq!(*scheduler.last_error().borrow(), None);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_previous_nearby_set() {
        let (mut scheduler, source, store, _dispatcher) = scheduler();
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_in_range("friend")]);
        scheduler.run_cycle().await;
        let before = scheduler.subscribe().borrow().clone();

        store.fail_next_list(StoreError::Decode("unexpected token".into()));
        scheduler.run_cycle().await;

        assert_eq!(*scheduler.subscribe().borrow(), before);
        assert!(matches!(
            *scheduler.last_error().borrow(),
            Some(NearbyError::DecodeFailure(_))
        ));
    }

    #[tokio::test]
    async fn dispatch_failure_is_swallowed_and_dedup_holds() {
        let (mut scheduler, source, store, dispatcher) = scheduler();
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_in_range("friend")]);
        dispatcher.fail_next("channel closed");

        scheduler.run_cycle().await;

        // The attempt failed but counts as notified: no retry next cycle.
        assert_eq!(dispatcher.dispatch_count(), 0);
        assert_eq!(scheduler.notified_count(), 1);
        assert_eq!(*scheduler.last_error().borrow(), None);

        scheduler.run_cycle().await;
        assert_eq!(dispatcher.dispatch_count(), 0);
    }

    // ===========================================
    // Publication semantics
    // ===========================================

    #[tokio::test]
    async fn publish_replaces_rather_than_merges() {
        let (mut scheduler, source, store, _dispatcher) = scheduler();
        source.publish_fix(local_fix());

        store.set_peers(vec![peer_in_range("a"), peer_in_range("b")]);
        scheduler.run_cycle().await;
        assert_eq!(scheduler.subscribe().borrow().len(), 2);

        store.set_peers(vec![peer_in_range("b")]);
        scheduler.run_cycle().await;

        let nearby = scheduler.subscribe().borrow().clone();
        assert_eq!(nearby.identities(), vec![&id("b")]);
    }

    #[tokio::test]
    async fn initial_published_set_is_empty() {
        let (scheduler, _source, _store, _dispatcher) = scheduler();
        assert!(scheduler.subscribe().borrow().is_empty());
        assert_eq!(*scheduler.last_error().borrow(), None);
    }

    #[tokio::test]
    async fn multiple_peers_alert_in_discovery_order() {
        let (mut scheduler, source, store, dispatcher) = scheduler();
        source.publish_fix(local_fix());
        store.set_peers(vec![
            peer_in_range("first"),
            peer_out_of_range("skipped"),
            peer_in_range("second"),
        ]);

        scheduler.run_cycle().await;

        assert_eq!(dispatcher.dispatched(), vec![id("first"), id("second")]);
    }

    #[tokio::test]
    async fn session_reset_allows_realerting() {
        let (mut scheduler, source, store, dispatcher) = scheduler();
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_in_range("friend")]);

        scheduler.run_cycle().await;
        scheduler.reset_session();
        scheduler.run_cycle().await;

        assert_eq!(dispatcher.dispatch_count(), 2);
    }

    // ===========================================
    // Spawned scheduler lifecycle
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn spawned_scheduler_cycles_on_the_configured_cadence() {
        let source = SharedLocationSource::new();
        let store = MockLocationStore::new();
        let dispatcher = MockDispatcher::new();
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_in_range("friend")]);

        let config = SchedulerConfig::new(me())
            .with_radius_meters(100.0)
            .with_interval(Duration::from_secs(10));
        let handle =
            SyncScheduler::new(config, source, store.clone(), dispatcher.clone()).spawn();

        // First tick fires immediately; two more cadence slots pass.
        tokio::time::sleep(Duration::from_secs(25)).await;

        assert_eq!(store.upserts().len(), 3);
        assert_eq!(dispatcher.dispatch_count(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_cycles() {
        let source = SharedLocationSource::new();
        let store = MockLocationStore::new();
        let dispatcher = MockDispatcher::new();
        source.publish_fix(local_fix());

        let config = SchedulerConfig::new(me()).with_interval(Duration::from_secs(10));
        let handle = SyncScheduler::new(config, source, store.clone(), dispatcher).spawn();

        tokio::time::sleep(Duration::from_secs(5)).await;
        let cycles_before_stop = store.upserts().len();
        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.upserts().len(), cycles_before_stop);
    }

    /// Store whose upsert stalls, simulating a slow network. The call is
    /// recorded before the stall so tests can see when a cycle starts.
    #[derive(Clone)]
    struct SlowStore {
        inner: MockLocationStore,
        upsert_delay: Duration,
    }

    #[async_trait::async_trait]
    impl LocationStore for SlowStore {
        async fn upsert(
            &self,
            identity: &Identity,
            latitude: f64,
            longitude: f64,
        ) -> Result<(), StoreError> {
            self.inner.upsert(identity, latitude, longitude).await?;
            tokio::time::sleep(self.upsert_delay).await;
            Ok(())
        }

        async fn list(&self) -> Result<Vec<nearby_types::PeerLocation>, StoreError> {
            self.inner.list().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycle_never_overlaps_and_stop_discards_in_flight_work() {
        let source = SharedLocationSource::new();
        let store = MockLocationStore::new();
        let dispatcher = MockDispatcher::new();
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_in_range("friend")]);

        // Each upsert takes 15 s against a 10 s cadence.
        let slow = SlowStore {
            inner: store.clone(),
            upsert_delay: Duration::from_secs(15),
        };
        let config = SchedulerConfig::new(me()).with_interval(Duration::from_secs(10));
        let handle = SyncScheduler::new(config, source, slow, dispatcher.clone()).spawn();

        // 12 s in, the 10 s tick has already fired while the first cycle is
        // still inside its upsert. No second cycle may start underneath it.
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(store.upserts().len(), 1);

        // The first cycle finishes at 15 s; the overdue tick is coalesced
        // into exactly one follow-up cycle.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(store.upserts().len(), 2);
        assert_eq!(store.list_calls(), 1);
        assert_eq!(dispatcher.dispatch_count(), 1);

        // Stop lands while the second cycle is stalled in its upsert: the
        // in-flight cycle is dropped, so its fetch and evaluation never
        // run, while the first cycle's alert and published set survive.
        handle.stop().await;
        assert_eq!(store.upserts().len(), 2);
        assert_eq!(store.list_calls(), 1);
        assert_eq!(dispatcher.dispatch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_observe_published_updates() {
        let source = SharedLocationSource::new();
        let store = MockLocationStore::new();
        let dispatcher = MockDispatcher::new();
        source.publish_fix(local_fix());
        store.set_peers(vec![peer_in_range("friend")]);

        let config = SchedulerConfig::new(me()).with_interval(Duration::from_secs(10));
        let handle = SyncScheduler::new(config, source, store, dispatcher).spawn();

        let mut nearby = handle.subscribe();
        nearby.changed().await.unwrap();
        assert!(nearby.borrow().contains(&id("friend")));

        handle.stop().await;
    }
}
