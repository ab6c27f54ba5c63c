#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
    mpsc,
};

use awardwatch::{
    awards::AwardRegistry,
    cache::{CacheConfig, EligibilityCache},
    classifier::Spot,
    clock::ManualClock,
    error::DataAccessError,
    history::{ContactHistoryStore, ContactRecord, HistoryFilter, InMemoryContactHistory, Mode},
    membership::MemberLevel,
    roster::{InMemoryRoster, MemberRecord, RosterEntry, RosterLookup},
};
use time::{Date, OffsetDateTime, macros::date, macros::datetime};

pub const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);
pub const LONG_AGO: OffsetDateTime = datetime!(2020-03-15 18:30 UTC);

pub fn member(station: &str, number: &str, level: MemberLevel, joined: Date) -> MemberRecord {
    MemberRecord {
        station_id: station.to_string(),
        membership_number: number.to_string(),
        level,
        join_date: joined,
        key_type: None,
    }
}

pub fn cw_contact(station: &str, number: &str, at: OffsetDateTime) -> ContactRecord {
    ContactRecord {
        station_id: station.to_string(),
        timestamp: at,
        mode: Mode::Cw,
        membership_number: Some(number.to_string()),
        band: Some("40M".to_string()),
        key_type: None,
    }
}

pub fn spot(station: &str, mode: Mode, at: OffsetDateTime) -> Spot {
    Spot {
        station_id: station.to_string(),
        frequency_khz: 7_055.0,
        mode,
        observed_at: at,
        source: "test".to_string(),
        key_type: None,
    }
}

/// `count` distinct members, each worked once on CW at `LONG_AGO`.
pub fn worked_members(prefix: &str, count: usize, level: MemberLevel) -> (Vec<RosterEntry>, Vec<ContactRecord>) {
    let mut entries = Vec::with_capacity(count);
    let mut contacts = Vec::with_capacity(count);
    for index in 0..count {
        let station = format!("{prefix}{index:04}X");
        let number = format!("{}", 10_000 + index);
        entries.push(RosterEntry::current(member(
            &station,
            &number,
            level,
            date!(2019 - 01 - 01),
        )));
        contacts.push(cw_contact(&station, &number, LONG_AGO));
    }
    (entries, contacts)
}

pub fn registry() -> Arc<AwardRegistry> {
    Arc::new(AwardRegistry::builtin().expect("builtin table should load"))
}

pub fn cache_with(
    history: Arc<dyn ContactHistoryStore>,
    roster: Arc<dyn RosterLookup>,
    clock: Arc<ManualClock>,
) -> Arc<EligibilityCache> {
    Arc::new(EligibilityCache::with_clock(
        registry(),
        history,
        roster,
        clock,
        CacheConfig::default(),
    ))
}

/// Cache over in-memory adapters seeded with `entries` and `contacts`.
pub fn seeded_cache(
    entries: Vec<RosterEntry>,
    contacts: Vec<ContactRecord>,
) -> (Arc<EligibilityCache>, Arc<InMemoryContactHistory>, Arc<InMemoryRoster>) {
    let history = Arc::new(InMemoryContactHistory::from_contacts(contacts));
    let roster = Arc::new(InMemoryRoster::from_entries(entries));
    let clock = Arc::new(ManualClock::new(NOW));
    let cache = cache_with(history.clone(), roster.clone(), clock);
    (cache, history, roster)
}

pub struct FailingRoster;

impl RosterLookup for FailingRoster {
    fn find(&self, _station_id: &str) -> Result<Option<MemberRecord>, DataAccessError> {
        Err(DataAccessError::roster("connection refused"))
    }
}

/// History whose queries fail while `failing` is set.
pub struct FlakyHistory {
    pub inner: InMemoryContactHistory,
    pub failing: AtomicBool,
}

impl ContactHistoryStore for FlakyHistory {
    fn query(&self, filter: &HistoryFilter) -> Result<Vec<ContactRecord>, DataAccessError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(DataAccessError::history("database locked"));
        }
        self.inner.query(filter)
    }
}

/// History that announces each query and holds it until released.
pub struct GatedHistory {
    pub inner: InMemoryContactHistory,
    pub gated: AtomicBool,
    pub queries: AtomicU64,
    entered_tx: Mutex<mpsc::Sender<()>>,
    release_rx: Mutex<mpsc::Receiver<()>>,
}

pub struct Gate {
    pub entered_rx: mpsc::Receiver<()>,
    pub release_tx: mpsc::Sender<()>,
}

impl GatedHistory {
    pub fn new(contacts: Vec<ContactRecord>) -> (Self, Gate) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        (
            Self {
                inner: InMemoryContactHistory::from_contacts(contacts),
                gated: AtomicBool::new(false),
                queries: AtomicU64::new(0),
                entered_tx: Mutex::new(entered_tx),
                release_rx: Mutex::new(release_rx),
            },
            Gate {
                entered_rx,
                release_tx,
            },
        )
    }
}

impl ContactHistoryStore for GatedHistory {
    fn query(&self, filter: &HistoryFilter) -> Result<Vec<ContactRecord>, DataAccessError> {
        self.queries.fetch_add(1, Ordering::AcqRel);
        if self.gated.load(Ordering::Acquire) {
            let _ = self.entered_tx.lock().expect("lock poisoned").send(());
            let _ = self.release_rx.lock().expect("lock poisoned").recv();
        }
        self.inner.query(filter)
    }
}
