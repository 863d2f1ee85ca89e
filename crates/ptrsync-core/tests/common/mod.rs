//! Test doubles and common utilities for engine contract tests

#![allow(dead_code)]

use ptrsync_core::traits::{
    ChangeId, HostedZone, RecordChange, RecordCursor, RecordSet, RecordSetPage, RecordType,
    ZoneProvider,
};
use ptrsync_core::{Error, MemoryZoneProvider, ReverseZoneEntry, ReverseZoneIndex, Result};
use std::sync::{Arc, Mutex};

pub const FORWARD_ZONE_ID: &str = "XYZ789";
pub const FORWARD_ZONE_NAME: &str = "example.com.";
pub const REVERSE_ZONE_ID: &str = "ABC123";
pub const REVERSE_ZONE_NAME: &str = "10.in-addr.arpa.";

/// Provider holding `example.com.` (XYZ789) and `10.in-addr.arpa.` (ABC123)
pub async fn two_zone_provider() -> MemoryZoneProvider {
    let provider = MemoryZoneProvider::new();
    provider.add_zone(FORWARD_ZONE_ID, FORWARD_ZONE_NAME).await;
    provider.add_zone(REVERSE_ZONE_ID, REVERSE_ZONE_NAME).await;
    provider
}

/// Adds `app.example.com.` (10.0.0.5) to both zones; it sorts before
/// `host.example.com.` and `3.2.1.10.in-addr.arpa.`
pub async fn insert_earlier_neighbours(provider: &MemoryZoneProvider) {
    provider
        .insert_record(FORWARD_ZONE_ID, a_record("app.example.com.", "10.0.0.5"))
        .await;
    provider
        .insert_record(REVERSE_ZONE_ID, ptr_record("5.0.0.10.in-addr.arpa.", "app.example.com."))
        .await;
}

/// Adds `www.example.com.` (10.9.9.9) to both zones; it sorts after
/// `host.example.com.` and `3.2.1.10.in-addr.arpa.`
pub async fn insert_later_neighbours(provider: &MemoryZoneProvider) {
    provider
        .insert_record(FORWARD_ZONE_ID, a_record("www.example.com.", "10.9.9.9"))
        .await;
    provider
        .insert_record(REVERSE_ZONE_ID, ptr_record("9.9.9.10.in-addr.arpa.", "www.example.com."))
        .await;
}

/// `10.0.0.0/8 → ABC123`
pub fn ten_slash_eight() -> ReverseZoneIndex {
    ReverseZoneIndex::from_entries(vec![ReverseZoneEntry {
        network: "10.0.0.0/8".parse().expect("valid CIDR"),
        zone_name: REVERSE_ZONE_NAME.to_string(),
        zone_id: REVERSE_ZONE_ID.to_string(),
    }])
}

pub fn a_record(name: &str, ip: &str) -> RecordSet {
    RecordSet::new(name, RecordType::A, ip, 600)
}

pub fn ptr_record(name: &str, host: &str) -> RecordSet {
    RecordSet::new(name, RecordType::Ptr, host, 600)
}

/// One provider call, as seen by [`RecordingProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListZones(String),
    ListRecords(String),
    Change(String),
    Wait(String),
}

/// Wraps a provider and records every call in order
pub struct RecordingProvider<P> {
    inner: P,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl<P: ZoneProvider> RecordingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl<P: ZoneProvider> ZoneProvider for RecordingProvider<P> {
    async fn list_zones_by_name(&self, name: &str, max_items: u32) -> Result<Vec<HostedZone>> {
        self.push(Call::ListZones(name.to_string()));
        self.inner.list_zones_by_name(name, max_items).await
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordCursor>,
        max_items: Option<u32>,
    ) -> Result<RecordSetPage> {
        self.push(Call::ListRecords(zone_id.to_string()));
        self.inner.list_record_sets(zone_id, start, max_items).await
    }

    async fn change_record_sets(&self, zone_id: &str, changes: &[RecordChange]) -> Result<ChangeId> {
        self.push(Call::Change(zone_id.to_string()));
        self.inner.change_record_sets(zone_id, changes).await
    }

    async fn wait_for_change(&self, change_id: &ChangeId) -> Result<()> {
        self.push(Call::Wait(change_id.to_string()));
        self.inner.wait_for_change(change_id).await
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A provider that answers every call with canned responses
pub struct CannedProvider {
    pub zones: std::result::Result<Vec<HostedZone>, Error>,
    pub page: std::result::Result<RecordSetPage, Error>,
}

impl CannedProvider {
    pub fn zones(zones: Vec<HostedZone>) -> Self {
        Self {
            zones: Ok(zones),
            page: Ok(RecordSetPage::default()),
        }
    }

    pub fn page(page: RecordSetPage) -> Self {
        Self {
            zones: Ok(Vec::new()),
            page: Ok(page),
        }
    }
}

#[async_trait::async_trait]
impl ZoneProvider for CannedProvider {
    async fn list_zones_by_name(&self, _name: &str, _max_items: u32) -> Result<Vec<HostedZone>> {
        self.zones.clone()
    }

    async fn list_record_sets(
        &self,
        _zone_id: &str,
        _start: Option<&RecordCursor>,
        _max_items: Option<u32>,
    ) -> Result<RecordSetPage> {
        self.page.clone()
    }

    async fn change_record_sets(&self, _zone_id: &str, _changes: &[RecordChange]) -> Result<ChangeId> {
        Err(Error::provider("canned", "read-only provider"))
    }

    async fn wait_for_change(&self, _change_id: &ChangeId) -> Result<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "canned"
    }
}
