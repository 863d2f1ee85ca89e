// # Memory Zone Provider
//
// In-memory implementation of ZoneProvider.
//
// ## Purpose
//
// Models a hosted-zone DNS API closely enough to exercise the engine
// without network access:
//
// - zones are listed in DNS order (labels reversed), starting at the
//   closest match for the requested name
// - record listings are paginated, with a truncation flag and a cursor
// - change batches are atomic: every change is validated before any applies
// - a change is "in sync" as soon as it has been accepted
//
// Faults can be injected per zone, per change submission or per wait so
// tests can drive the orchestrator down its compensation paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::zone_provider::{
    ChangeAction, ChangeId, HostedZone, RecordChange, RecordCursor, RecordSet, RecordSetPage,
    ZoneProvider,
};

/// Page size when the caller does not ask for one
const DEFAULT_PAGE_SIZE: usize = 300;

const PROVIDER_NAME: &str = "memory";

/// A change batch as it was submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedChange {
    pub change_id: ChangeId,
    pub zone_id: String,
    pub changes: Vec<RecordChange>,
}

#[derive(Debug, Default)]
struct State {
    zones: Vec<HostedZone>,
    records: HashMap<String, Vec<RecordSet>>,
    submitted: Vec<SubmittedChange>,
    attempts: usize,
    faults: Faults,
}

#[derive(Debug, Default)]
struct Faults {
    zone_listing: Option<Error>,
    changes_in_zone: HashMap<String, Error>,
    change_attempt: HashMap<usize, Error>,
    next_wait: Option<Error>,
}

/// In-memory zone provider
///
/// Cloning shares the underlying zones, so a test can keep a handle for
/// assertions while the engine borrows another.
///
/// # Example
///
/// ```rust,no_run
/// use ptrsync_core::provider::MemoryZoneProvider;
/// use ptrsync_core::traits::{RecordSet, RecordType};
///
/// #[tokio::main]
/// async fn main() {
///     let provider = MemoryZoneProvider::new();
///     provider.add_zone("XYZ789", "example.com.").await;
///     provider
///         .insert_record("XYZ789", RecordSet::new("host.example.com.", RecordType::A, "10.1.2.3", 600))
///         .await;
///     assert_eq!(provider.records("XYZ789").await.len(), 1);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryZoneProvider {
    inner: Arc<RwLock<State>>,
    zone_lookups: Arc<AtomicUsize>,
}

impl MemoryZoneProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty hosted zone
    pub async fn add_zone(&self, id: impl Into<String>, name: impl Into<String>) {
        let zone = HostedZone::new(id, name);
        let mut state = self.inner.write().await;
        state.records.entry(zone.id.clone()).or_default();
        state.zones.push(zone);
    }

    /// Store a record set directly, bypassing change batches
    pub async fn insert_record(&self, zone_id: &str, record: RecordSet) {
        let mut state = self.inner.write().await;
        state
            .records
            .entry(zone_id.to_string())
            .or_default()
            .push(record);
    }

    /// Record sets of a zone in listing order
    pub async fn records(&self, zone_id: &str) -> Vec<RecordSet> {
        let state = self.inner.read().await;
        let mut records = state.records.get(zone_id).cloned().unwrap_or_default();
        records.sort_by(|a, b| listing_key(a).cmp(&listing_key(b)));
        records
    }

    /// Record set stored under `name` with the given type
    pub async fn find_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &crate::traits::RecordType,
    ) -> Option<RecordSet> {
        let state = self.inner.read().await;
        state
            .records
            .get(zone_id)?
            .iter()
            .find(|r| r.name == name && &r.record_type == record_type)
            .cloned()
    }

    /// Change batches accepted so far, in submission order
    pub async fn submitted_changes(&self) -> Vec<SubmittedChange> {
        self.inner.read().await.submitted.clone()
    }

    /// Number of `list_zones_by_name` calls made
    pub fn zone_lookup_count(&self) -> usize {
        self.zone_lookups.load(Ordering::SeqCst)
    }

    /// Fail every zone listing with `error`
    pub async fn fail_zone_listing(&self, error: Error) {
        self.inner.write().await.faults.zone_listing = Some(error);
    }

    /// Reject every change batch submitted to `zone_id`
    pub async fn fail_changes_in_zone(&self, zone_id: impl Into<String>, error: Error) {
        self.inner
            .write()
            .await
            .faults
            .changes_in_zone
            .insert(zone_id.into(), error);
    }

    /// Reject the `attempt`-th change submission (1-based, across all zones)
    pub async fn fail_change_attempt(&self, attempt: usize, error: Error) {
        self.inner
            .write()
            .await
            .faults
            .change_attempt
            .insert(attempt, error);
    }

    /// Fail the next `wait_for_change` call, after the change was applied
    pub async fn fail_next_wait(&self, error: Error) {
        self.inner.write().await.faults.next_wait = Some(error);
    }

    /// Stop injecting faults
    pub async fn clear_faults(&self) {
        self.inner.write().await.faults = Faults::default();
    }
}

/// DNS ordering key: labels reversed, trailing dot ignored
fn dns_order_key(name: &str) -> Vec<String> {
    name.trim_end_matches('.')
        .split('.')
        .rev()
        .map(|label| label.to_ascii_lowercase())
        .collect()
}

fn listing_key(record: &RecordSet) -> (Vec<String>, String) {
    (
        dns_order_key(&record.name),
        record.record_type.as_str().to_string(),
    )
}

fn cursor_key(cursor: &RecordCursor) -> (Vec<String>, String) {
    (
        dns_order_key(&cursor.name),
        cursor
            .record_type
            .as_ref()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
    )
}

fn apply_changes(records: &mut Vec<RecordSet>, changes: &[RecordChange]) -> Result<(), Error> {
    let mut staged = records.clone();

    for change in changes {
        let position = staged.iter().position(|r| {
            r.name == change.record.name && r.record_type == change.record.record_type
        });

        match (change.action, position) {
            (ChangeAction::Create, None) => staged.push(change.record.clone()),
            (ChangeAction::Create, Some(_)) => {
                return Err(Error::provider(
                    PROVIDER_NAME,
                    format!(
                        "InvalidChangeBatch: record set {} {} already exists",
                        change.record.name, change.record.record_type
                    ),
                ));
            }
            (ChangeAction::Delete, Some(idx)) if staged[idx] == change.record => {
                staged.remove(idx);
            }
            (ChangeAction::Delete, _) => {
                return Err(Error::provider(
                    PROVIDER_NAME,
                    format!(
                        "InvalidChangeBatch: record set {} {} not found with the given values",
                        change.record.name, change.record.record_type
                    ),
                ));
            }
        }
    }

    *records = staged;
    Ok(())
}

#[async_trait]
impl ZoneProvider for MemoryZoneProvider {
    async fn list_zones_by_name(&self, name: &str, max_items: u32) -> Result<Vec<HostedZone>, Error> {
        self.zone_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.read().await;

        if let Some(error) = &state.faults.zone_listing {
            return Err(error.clone());
        }

        let start = dns_order_key(name);
        let mut zones: Vec<&HostedZone> = state
            .zones
            .iter()
            .filter(|zone| dns_order_key(&zone.name) >= start)
            .collect();
        zones.sort_by_key(|zone| dns_order_key(&zone.name));

        Ok(zones
            .into_iter()
            .take(max_items as usize)
            .cloned()
            .collect())
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordCursor>,
        max_items: Option<u32>,
    ) -> Result<RecordSetPage, Error> {
        let state = self.inner.read().await;

        let mut records = state
            .records
            .get(zone_id)
            .cloned()
            .ok_or_else(|| {
                Error::provider(PROVIDER_NAME, format!("NoSuchHostedZone: {zone_id}"))
            })?;
        records.sort_by(|a, b| listing_key(a).cmp(&listing_key(b)));

        if let Some(cursor) = start {
            let from = cursor_key(cursor);
            records.retain(|r| listing_key(r) >= from);
        }

        let page_size = max_items.map_or(DEFAULT_PAGE_SIZE, |n| n as usize);
        let truncated = records.len() > page_size;
        let next = records.get(page_size).map(|r| RecordCursor {
            name: r.name.clone(),
            record_type: Some(r.record_type.clone()),
        });
        records.truncate(page_size);

        Ok(RecordSetPage {
            records,
            truncated,
            next,
        })
    }

    async fn change_record_sets(
        &self,
        zone_id: &str,
        changes: &[RecordChange],
    ) -> Result<ChangeId, Error> {
        let mut state = self.inner.write().await;
        state.attempts += 1;
        let attempt = state.attempts;

        if let Some(error) = state.faults.change_attempt.remove(&attempt) {
            return Err(error);
        }
        if let Some(error) = state.faults.changes_in_zone.get(zone_id) {
            return Err(error.clone());
        }

        let records = state.records.get_mut(zone_id).ok_or_else(|| {
            Error::provider(PROVIDER_NAME, format!("NoSuchHostedZone: {zone_id}"))
        })?;
        apply_changes(records, changes)?;

        let change_id = ChangeId::new(format!("C{attempt:06}"));
        state.submitted.push(SubmittedChange {
            change_id: change_id.clone(),
            zone_id: zone_id.to_string(),
            changes: changes.to_vec(),
        });
        Ok(change_id)
    }

    async fn wait_for_change(&self, change_id: &ChangeId) -> Result<(), Error> {
        let mut state = self.inner.write().await;

        if let Some(error) = state.faults.next_wait.take() {
            return Err(error);
        }
        if !state.submitted.iter().any(|c| &c.change_id == change_id) {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("NoSuchChange: {change_id}"),
            ));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
