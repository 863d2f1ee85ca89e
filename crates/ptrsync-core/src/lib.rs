// # ptrsync-core
//
// Keeps forward (A/CNAME) and reverse (PTR) DNS records consistent in a
// hosted-zone DNS provider.
//
// ## Architecture Overview
//
// - **ZoneProvider**: Trait for the hosted-zone API the engine drives
// - **ZoneResolver**: Zone name → zone ID, tolerant of a trailing dot
// - **ReverseZoneIndex**: Ordered CIDR → reverse zone mapping (first match wins)
// - **RecordLookup**: Exact single-record lookup before deletes
// - **ChangeWaiter**: Submit a change batch and wait until it is in sync
// - **ChangeOrchestrator**: Forward + reverse changes as a compensating transaction
// - **RecordPages**: Lazy paged listing of a zone
//
// ## Design Principles
//
// 1. **Injected capability**: every component borrows a `ZoneProvider`; there
//    is no global client
// 2. **Fail fast**: components return the first error; only the orchestrator
//    remediates, and never hides a failed remediation
// 3. **No cached state**: zones are resolved fresh on every invocation
// 4. **Sequential**: one change batch in flight at a time

pub mod config;
pub mod engine;
pub mod error;
pub mod listing;
pub mod lookup;
pub mod provider;
pub mod request;
pub mod reverse;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use config::{ReverseHostedZone, ReverseZonesConfig};
pub use engine::{
    AppliedChange, ChangeOrchestrator, ChangeOutcome, ChangeWaiter, RECORD_TTL, SyncEvent,
    SyncState,
};
pub use error::{Error, Result};
pub use listing::RecordPages;
pub use lookup::RecordLookup;
pub use provider::MemoryZoneProvider;
pub use request::{ChangeRequest, Operation, RecordKind};
pub use reverse::{Cidr, ReverseZoneEntry, ReverseZoneIndex, reverse_name};
pub use traits::ZoneProvider;
pub use zone::ZoneResolver;
