// # Zone Provider Trait
//
// Defines the capability the engine needs from a hosted-zone DNS API.
//
// ## Implementations
//
// - In-memory: `ptrsync_core::provider::MemoryZoneProvider` (tests, embedding)
// - Route 53: `ptrsync-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use ptrsync_core::ZoneProvider;
//
// let zones = provider.list_zones_by_name("example.com.", 1).await?;
// let change = provider.change_record_sets(&zones[0].id, &changes).await?;
// provider.wait_for_change(&change).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider-managed hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Provider-assigned identifier
    pub id: String,
    /// Fully-qualified, dot-terminated zone name
    pub name: String,
}

impl HostedZone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// DNS record type
///
/// The engine only ever writes `A`, `CNAME` and `PTR`; other types show up
/// when listing a zone and are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    A,
    Cname,
    Ptr,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Cname => "CNAME",
            RecordType::Ptr => "PTR",
            RecordType::Other(other) => other,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "CNAME" => RecordType::Cname,
            "PTR" => RecordType::Ptr,
            other => RecordType::Other(other.to_string()),
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        RecordType::from(value.as_str())
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

/// A resource record set: `(name, type)` plus its values and TTL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Record name, the lookup key within a zone
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record values (IP address or hostname)
    pub values: Vec<String>,
    /// Time-to-live in seconds (absent for alias-style records)
    pub ttl: Option<u32>,
}

impl RecordSet {
    /// Create a single-valued record set
    pub fn new(
        name: impl Into<String>,
        record_type: RecordType,
        value: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            values: vec![value.into()],
            ttl: Some(ttl),
        }
    }

    /// The first value, if any
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Position in a zone's record listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCursor {
    /// Name to start at (lexicographic position)
    pub name: String,
    /// Type to start at within that name
    pub record_type: Option<RecordType>,
}

impl RecordCursor {
    /// Cursor starting at a name, any type
    pub fn at(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: None,
        }
    }
}

/// One page of a record listing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSetPage {
    /// Records in listing order
    pub records: Vec<RecordSet>,
    /// Whether more records follow this page
    pub truncated: bool,
    /// Where the next page starts (set when `truncated`)
    pub next: Option<RecordCursor>,
}

/// Change action within a change batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Create => f.write_str("CREATE"),
            ChangeAction::Delete => f.write_str("DELETE"),
        }
    }
}

/// One entry of a change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    pub action: ChangeAction,
    pub record: RecordSet,
}

impl RecordChange {
    pub fn create(record: RecordSet) -> Self {
        Self {
            action: ChangeAction::Create,
            record,
        }
    }

    pub fn delete(record: RecordSet) -> Self {
        Self {
            action: ChangeAction::Delete,
            record,
        }
    }
}

/// Provider-assigned identifier of a submitted change batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(pub String);

impl ChangeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for hosted-zone DNS provider implementations
///
/// The engine treats a provider as a stateless capability that can be
/// reused across sequential calls. Providers execute exactly the call they
/// are asked for:
///
/// - no retries or backoff (failures surface to the caller as-is)
/// - no caching of zones or records between calls
/// - no background tasks
///
/// # Thread Safety
///
/// Implementations must be usable across async tasks.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// List hosted zones in name order starting at the closest match for
    /// `name`, returning at most `max_items` zones
    ///
    /// The first zone is the provider's best match, which is not necessarily
    /// a zone with exactly this name.
    async fn list_zones_by_name(
        &self,
        name: &str,
        max_items: u32,
    ) -> Result<Vec<HostedZone>, crate::Error>;

    /// List record sets of a zone starting at `start` (or the zone apex)
    ///
    /// `max_items` of `None` uses the provider's default page size.
    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordCursor>,
        max_items: Option<u32>,
    ) -> Result<RecordSetPage, crate::Error>;

    /// Submit one atomic single-zone change batch
    async fn change_record_sets(
        &self,
        zone_id: &str,
        changes: &[RecordChange],
    ) -> Result<ChangeId, crate::Error>;

    /// Block until the provider reports the change as fully propagated
    async fn wait_for_change(&self, change_id: &ChangeId) -> Result<(), crate::Error>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
