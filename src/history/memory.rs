use std::{
    fs,
    path::Path,
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    error::DataAccessError,
    history::{
        ports::ContactHistoryStore,
        types::{ContactRecord, HistoryFilter},
    },
};

/// Append-only contact log held in memory.
#[derive(Debug, Default)]
pub struct InMemoryContactHistory {
    contacts: RwLock<Vec<ContactRecord>>,
    queries: AtomicU64,
}

impl InMemoryContactHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_contacts(contacts: impl IntoIterator<Item = ContactRecord>) -> Self {
        Self {
            contacts: RwLock::new(contacts.into_iter().collect()),
            queries: AtomicU64::new(0),
        }
    }

    pub fn load_json(path: &Path) -> Result<Self, DataAccessError> {
        let content = fs::read_to_string(path).map_err(|err| {
            DataAccessError::history(format!("failed to read '{}': {err}", path.display()))
        })?;
        let contacts: Vec<ContactRecord> = serde_json::from_str(&content).map_err(|err| {
            DataAccessError::history(format!("failed to parse '{}': {err}", path.display()))
        })?;
        Ok(Self::from_contacts(contacts))
    }

    /// Persists one contact. Callers notify the eligibility cache afterwards.
    pub fn commit(&self, contact: ContactRecord) {
        self.contacts
            .write()
            .expect("lock poisoned")
            .push(contact);
    }

    pub fn len(&self) -> usize {
        self.contacts.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `query` calls served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Acquire)
    }
}

impl ContactHistoryStore for InMemoryContactHistory {
    fn query(&self, filter: &HistoryFilter) -> Result<Vec<ContactRecord>, DataAccessError> {
        self.queries.fetch_add(1, Ordering::AcqRel);
        Ok(self
            .contacts
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|contact| filter.matches(contact))
            .cloned()
            .collect())
    }
}
