//! Core traits for the synchronization engine
//!
//! - [`ZoneProvider`]: the hosted-zone DNS API capability the engine drives

pub mod zone_provider;

pub use zone_provider::{
    ChangeAction, ChangeId, HostedZone, RecordChange, RecordCursor, RecordSet, RecordSetPage,
    RecordType, ZoneProvider,
};
