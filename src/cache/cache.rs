use std::sync::{
    Arc, Mutex, PoisonError, RwLock, TryLockError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{
    awards::AwardRegistry,
    cache::snapshot::EligibilitySnapshot,
    clock::{Clock, SystemClock},
    error::RefreshError,
    history::{ContactHistoryStore, ContactRecord, HistoryFilter},
    progress::{AwardProgress, compute_all_until},
    roster::RosterLookup,
};

const DEFAULT_TTL_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }
}

/// Shared, lazily refreshed view of every award's progress.
///
/// Readers get an `Arc` to an immutable snapshot. A snapshot is stale once it is older
/// than the TTL or once `invalidate` has bumped the generation past the one it was
/// built at. At most one refresh runs at a time.
pub struct EligibilityCache {
    registry: Arc<AwardRegistry>,
    history: Arc<dyn ContactHistoryStore>,
    roster: Arc<dyn RosterLookup>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    generation: AtomicU64,
    snapshot: RwLock<Option<Arc<EligibilitySnapshot>>>,
    refresh_gate: Mutex<()>,
    background_refresh: AtomicBool,
    refreshes: AtomicU64,
    last_error: Mutex<Option<RefreshError>>,
    shutdown: CancellationToken,
}

impl EligibilityCache {
    pub fn new(
        registry: Arc<AwardRegistry>,
        history: Arc<dyn ContactHistoryStore>,
        roster: Arc<dyn RosterLookup>,
        config: CacheConfig,
    ) -> Self {
        Self::with_clock(registry, history, roster, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        registry: Arc<AwardRegistry>,
        history: Arc<dyn ContactHistoryStore>,
        roster: Arc<dyn RosterLookup>,
        clock: Arc<dyn Clock>,
        config: CacheConfig,
    ) -> Self {
        Self {
            registry,
            history,
            roster,
            clock,
            config,
            generation: AtomicU64::new(0),
            snapshot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            background_refresh: AtomicBool::new(false),
            refreshes: AtomicU64::new(0),
            last_error: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<AwardRegistry> {
        &self.registry
    }

    pub fn roster(&self) -> &Arc<dyn RosterLookup> {
        &self.roster
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Completed refreshes since construction.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Acquire)
    }

    pub fn last_error(&self) -> Option<RefreshError> {
        self.last_error.lock().expect("lock poisoned").clone()
    }

    /// Marks every snapshot built so far as stale. Does not recompute.
    pub fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(target: "cache", generation = generation, "eligibility_cache_invalidated");
    }

    /// Hook for the contact store: call after `contact` is durably committed.
    pub fn contact_committed(&self, contact: &ContactRecord) {
        tracing::debug!(
            target: "cache",
            station_id = %contact.station_id,
            mode = %contact.mode,
            "contact_committed"
        );
        self.invalidate();
    }

    pub fn is_stale(&self, snapshot: &EligibilitySnapshot) -> bool {
        snapshot.generation() != self.generation()
            || self.clock.now() - snapshot.computed_at() > self.config.ttl
    }

    /// Last published snapshot, fresh or not. Never blocks on a refresh.
    pub fn current(&self) -> Option<Arc<EligibilitySnapshot>> {
        self.snapshot.read().expect("lock poisoned").clone()
    }

    /// A snapshot that reflects every contact committed before the most recent
    /// `invalidate`. Waits for an in-flight refresh and rebuilds if still stale.
    pub fn get_snapshot(&self) -> Result<Arc<EligibilitySnapshot>, RefreshError> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }
        let _gate = self.refresh_gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.refresh_locked()
    }

    pub fn get(&self, award_id: &str) -> Result<Option<AwardProgress>, RefreshError> {
        Ok(self.get_snapshot()?.progress(award_id).cloned())
    }

    /// Refreshes when stale. While another refresh is running, returns the previous
    /// snapshot instead of waiting (or waits when there is none yet).
    pub fn refresh_if_stale(&self) -> Result<Arc<EligibilitySnapshot>, RefreshError> {
        let prior = self.current();
        if let Some(snapshot) = &prior
            && !self.is_stale(snapshot)
        {
            return Ok(Arc::clone(snapshot));
        }

        let _gate = match self.refresh_gate.try_lock() {
            Ok(gate) => gate,
            Err(TryLockError::WouldBlock) => match prior {
                Some(snapshot) => {
                    tracing::trace!(target: "cache", "refresh_in_flight_serving_prior_snapshot");
                    return Ok(snapshot);
                }
                None => self
                    .refresh_gate
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            },
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        self.refresh_locked()
    }

    /// Schedules `refresh_if_stale` off the caller's thread unless one is already
    /// scheduled. Runs on the tokio blocking pool when a runtime is present.
    pub fn request_refresh(self: &Arc<Self>) {
        if self.shutdown.is_cancelled() || self.fresh_snapshot().is_some() {
            return;
        }
        if self.background_refresh.swap(true, Ordering::AcqRel) {
            return;
        }

        let cache = Arc::clone(self);
        let job = move || {
            if let Err(err) = cache.refresh_if_stale() {
                tracing::debug!(target: "cache", error = %err, "background_refresh_failed");
            }
            cache.background_refresh.store(false, Ordering::Release);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                if let Err(err) = std::thread::Builder::new()
                    .name("awardwatch-refresh".to_string())
                    .spawn(job)
                {
                    self.background_refresh.store(false, Ordering::Release);
                    tracing::warn!(
                        target: "cache",
                        error = %err,
                        "background_refresh_spawn_failed"
                    );
                }
            }
        }
    }

    /// Cancels in-flight and future refreshes. The published snapshot stays readable.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn fresh_snapshot(&self) -> Option<Arc<EligibilitySnapshot>> {
        self.current().filter(|snapshot| !self.is_stale(snapshot))
    }

    /// Caller holds `refresh_gate`.
    fn refresh_locked(&self) -> Result<Arc<EligibilitySnapshot>, RefreshError> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        match self.rebuild() {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                *self.last_error.lock().expect("lock poisoned") = Some(err.clone());
                let prior = self.current();
                tracing::warn!(
                    target: "cache",
                    error = %err,
                    prior_generation = prior.as_ref().map(|snapshot| snapshot.generation()),
                    "eligibility_refresh_failed"
                );
                match (&err, prior) {
                    (RefreshError::DataAccess(_), Some(prior)) => Ok(prior),
                    _ => Err(err),
                }
            }
        }
    }

    fn rebuild(&self) -> Result<Arc<EligibilitySnapshot>, RefreshError> {
        if self.shutdown.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }

        // Read before the query so a contact committed during the scan leaves this
        // snapshot stale.
        let generation = self.generation.load(Ordering::Acquire);
        let started_at = self.clock.now();

        let contacts = self.history.query(&HistoryFilter::all())?;
        let progress = compute_all_until(
            &contacts,
            self.roster.as_ref(),
            &self.registry,
            &self.shutdown,
        )?;
        if self.shutdown.is_cancelled() {
            tracing::info!(target: "cache", generation = generation, "refresh_cancelled");
            return Err(RefreshError::Cancelled);
        }

        let snapshot = Arc::new(EligibilitySnapshot::new(
            progress, &contacts, started_at, generation,
        ));
        *self.snapshot.write().expect("lock poisoned") = Some(Arc::clone(&snapshot));
        self.refreshes.fetch_add(1, Ordering::AcqRel);
        *self.last_error.lock().expect("lock poisoned") = None;

        tracing::info!(
            target: "cache",
            generation = generation,
            contacts = contacts.len(),
            awards = snapshot.progress_map().len(),
            "eligibility_snapshot_published"
        );
        Ok(snapshot)
    }
}
