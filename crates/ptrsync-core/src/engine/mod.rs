//! Forward/reverse change orchestration
//!
//! The orchestrator keeps an A record and its PTR record consistent as a
//! unit. The provider has no multi-zone transaction, so a pair is written
//! as two single-zone changes and a failure of the second is compensated
//! by undoing the first.
//!
//! ## State Flow
//!
//! ```text
//! Idle ─▶ ForwardSubmitted ─▶ ForwardConfirmed ─▶ ReverseSubmitted ─▶ Committed
//!                                                        │
//!                                                        ▼ (reverse failed)
//!                                                   Compensating
//!                                                   │          │
//!                                                   ▼          ▼
//!                                              RolledBack  RollbackFailed
//! ```
//!
//! ## Error Policy
//!
//! - Reverse zone selection runs before any mutation; if no network covers
//!   the address nothing is written.
//! - A failed reverse step returns the reverse step's own error once the
//!   compensation succeeded.
//! - A failed compensation returns [`Error::Rollback`] carrying both causes.
//!
//! Every step is awaited to completion before the next begins; at most one
//! change batch is ever in flight.

pub mod waiter;

pub use waiter::ChangeWaiter;

use crate::config::ReverseZonesConfig;
use crate::error::{Error, Result};
use crate::lookup::RecordLookup;
use crate::request::{ChangeRequest, Operation, RecordKind};
use crate::reverse::{ReverseZoneIndex, reverse_name};
use crate::traits::{ChangeAction, ChangeId, RecordChange, RecordSet, RecordType, ZoneProvider};
use crate::zone::ZoneResolver;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// TTL of every record the engine creates
pub const RECORD_TTL: u32 = 600;

/// Progress of one orchestrated operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    Idle,
    ForwardSubmitted,
    ForwardConfirmed,
    ReverseSubmitted,
    Committed,
    Compensating,
    RolledBack,
    RollbackFailed,
}

/// State transition emitted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    pub hostname: String,
    pub state: SyncState,
}

/// One change batch that was applied and confirmed in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedChange {
    pub zone_id: String,
    pub change_id: ChangeId,
    pub action: ChangeAction,
    pub record: RecordSet,
    pub confirmed_at: DateTime<Utc>,
}

/// Result of a successful operation: the applied changes, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeOutcome {
    pub applied: Vec<AppliedChange>,
}

/// Executes record changes against a zone provider
///
/// Holds no provider state between calls; zones are resolved fresh on
/// every operation and the reverse zone index is fixed at construction.
pub struct ChangeOrchestrator<'a> {
    provider: &'a dyn ZoneProvider,
    reverse_zones: ReverseZoneIndex,
    event_tx: Option<mpsc::Sender<SyncEvent>>,
}

impl<'a> ChangeOrchestrator<'a> {
    pub fn new(provider: &'a dyn ZoneProvider, reverse_zones: ReverseZoneIndex) -> Self {
        Self {
            provider,
            reverse_zones,
            event_tx: None,
        }
    }

    /// Build the reverse zone index from configuration, then the orchestrator
    pub async fn from_config(
        provider: &'a dyn ZoneProvider,
        config: &ReverseZonesConfig,
    ) -> Result<Self> {
        let resolver = ZoneResolver::new(provider);
        let reverse_zones = ReverseZoneIndex::build(&config.reverse_hosted_zones, &resolver).await?;
        Ok(Self::new(provider, reverse_zones))
    }

    /// Emit state transitions on a bounded channel
    ///
    /// When the channel is full, events are dropped with a warning; the
    /// operation itself never waits on a slow consumer.
    pub fn with_event_channel(mut self, capacity: usize) -> (Self, mpsc::Receiver<SyncEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        self.event_tx = Some(tx);
        (self, rx)
    }

    pub fn reverse_zones(&self) -> &ReverseZoneIndex {
        &self.reverse_zones
    }

    /// Validate `request`, resolve its zone and execute it
    pub async fn apply(&self, request: &ChangeRequest) -> Result<ChangeOutcome> {
        request.validate()?;
        let zone_id = ZoneResolver::new(self.provider)
            .resolve(&request.zone_name)
            .await?;

        match (request.operation, request.kind, request.ip, request.cname.as_deref()) {
            (Operation::Add, RecordKind::A, Some(ip), _) => {
                self.add_a(&request.hostname, ip, &zone_id).await
            }
            (Operation::Remove, RecordKind::A, Some(ip), _) => {
                self.remove_a(&request.hostname, ip, &zone_id, None).await
            }
            (Operation::Add, RecordKind::Cname, _, Some(target)) => {
                self.add_cname(&request.hostname, target, &zone_id).await
            }
            (Operation::Remove, RecordKind::Cname, _, Some(target)) => {
                let existing = RecordLookup::new(self.provider)
                    .find_exact(&request.hostname, &zone_id)
                    .await?;
                if existing.record_type == RecordType::Cname && existing.value() != Some(target) {
                    return Err(Error::invalid_input(format!(
                        "{} is CNAME {:?}, not {target}",
                        request.hostname, existing.values
                    )));
                }
                self.remove_cname(&request.hostname, &zone_id, Some(existing))
                    .await
            }
            _ => Err(Error::invalid_input("choose ip or cname")),
        }
    }

    /// Remove whatever `hostname` currently points at in `zone_name`
    ///
    /// The existing record decides the path: an A record is removed together
    /// with its PTR, a CNAME on its own.
    pub async fn delete_host(&self, hostname: &str, zone_name: &str) -> Result<ChangeOutcome> {
        let zone_id = ZoneResolver::new(self.provider).resolve(zone_name).await?;
        let existing = RecordLookup::new(self.provider)
            .find_exact(hostname, &zone_id)
            .await?;

        match existing.record_type {
            RecordType::A => {
                let ip = first_ipv4(&existing)?;
                self.remove_a(hostname, ip, &zone_id, Some(existing)).await
            }
            RecordType::Cname => self.remove_cname(hostname, &zone_id, Some(existing)).await,
            ref other => Err(Error::invalid_input(format!(
                "{hostname} is a {other} record; only A and CNAME records can be deleted"
            ))),
        }
    }

    /// Create an A record and its PTR record
    pub async fn add_a(&self, hostname: &str, ip: Ipv4Addr, zone_id: &str) -> Result<ChangeOutcome> {
        let reverse_zone_id = self.reverse_zones.lookup(IpAddr::V4(ip))?.to_string();
        let waiter = ChangeWaiter::new(self.provider);
        let mut outcome = ChangeOutcome::default();

        info!(
            "Adding {} -> {} (zone {}, reverse zone {})",
            hostname, ip, zone_id, reverse_zone_id
        );

        let forward = RecordSet::new(hostname, RecordType::A, ip.to_string(), RECORD_TTL);
        self.transition(hostname, SyncState::ForwardSubmitted);
        let change = RecordChange::create(forward.clone());
        let change_id = waiter
            .submit_and_wait(zone_id, std::slice::from_ref(&change))
            .await?;
        outcome.record(zone_id, change_id, change);
        self.transition(hostname, SyncState::ForwardConfirmed);

        let ptr = RecordSet::new(reverse_name(ip), RecordType::Ptr, hostname, RECORD_TTL);
        self.transition(hostname, SyncState::ReverseSubmitted);
        let change = RecordChange::create(ptr);
        match waiter
            .submit_and_wait(&reverse_zone_id, std::slice::from_ref(&change))
            .await
        {
            Ok(change_id) => {
                outcome.record(&reverse_zone_id, change_id, change);
                self.transition(hostname, SyncState::Committed);
                Ok(outcome)
            }
            Err(cause) => {
                // Delete exactly the record set that was created, no lookup
                let revert = [RecordChange::delete(forward)];
                let compensation = waiter.submit_and_wait(zone_id, &revert);
                Err(self.compensate(hostname, zone_id, cause, compensation).await)
            }
        }
    }

    /// Delete an A record and then its PTR record
    ///
    /// `existing` is the exact record set to delete; it is looked up when
    /// the caller does not have it.
    pub async fn remove_a(
        &self,
        hostname: &str,
        ip: Ipv4Addr,
        zone_id: &str,
        existing: Option<RecordSet>,
    ) -> Result<ChangeOutcome> {
        let reverse_zone_id = self.reverse_zones.lookup(IpAddr::V4(ip))?.to_string();
        let lookup = RecordLookup::new(self.provider);
        let waiter = ChangeWaiter::new(self.provider);
        let mut outcome = ChangeOutcome::default();

        let forward = match existing {
            Some(record) => record,
            None => lookup.find_exact(hostname, zone_id).await?,
        };
        let ip_text = ip.to_string();
        if forward.record_type != RecordType::A || !forward.values.contains(&ip_text) {
            return Err(Error::invalid_input(format!(
                "{hostname} is {} {:?}, not A {ip}",
                forward.record_type, forward.values
            )));
        }

        info!(
            "Removing {} -> {} (zone {}, reverse zone {})",
            hostname, ip, zone_id, reverse_zone_id
        );

        self.transition(hostname, SyncState::ForwardSubmitted);
        let change = RecordChange::delete(forward);
        let change_id = waiter
            .submit_and_wait(zone_id, std::slice::from_ref(&change))
            .await?;
        outcome.record(zone_id, change_id, change);
        self.transition(hostname, SyncState::ForwardConfirmed);

        self.transition(hostname, SyncState::ReverseSubmitted);
        let ptr_name = reverse_name(ip);
        let reverse = async {
            let ptr = lookup.find_exact(&ptr_name, &reverse_zone_id).await?;
            let change = RecordChange::delete(ptr);
            let change_id = waiter
                .submit_and_wait(&reverse_zone_id, std::slice::from_ref(&change))
                .await?;
            Ok::<_, Error>((change_id, change))
        };

        match reverse.await {
            Ok((change_id, change)) => {
                outcome.record(&reverse_zone_id, change_id, change);
                self.transition(hostname, SyncState::Committed);
                Ok(outcome)
            }
            Err(cause) => {
                let restored = RecordSet::new(hostname, RecordType::A, ip.to_string(), RECORD_TTL);
                let restore = [RecordChange::create(restored)];
                let compensation = waiter.submit_and_wait(zone_id, &restore);
                Err(self.compensate(hostname, zone_id, cause, compensation).await)
            }
        }
    }

    /// Create a CNAME record (single step, nothing to compensate)
    pub async fn add_cname(&self, hostname: &str, target: &str, zone_id: &str) -> Result<ChangeOutcome> {
        info!("Adding {} CNAME {} (zone {})", hostname, target, zone_id);

        let record = RecordSet::new(hostname, RecordType::Cname, target, RECORD_TTL);
        self.single_change(hostname, zone_id, RecordChange::create(record))
            .await
    }

    /// Delete a CNAME record (single step, nothing to compensate)
    pub async fn remove_cname(
        &self,
        hostname: &str,
        zone_id: &str,
        existing: Option<RecordSet>,
    ) -> Result<ChangeOutcome> {
        let record = match existing {
            Some(record) => record,
            None => {
                RecordLookup::new(self.provider)
                    .find_exact(hostname, zone_id)
                    .await?
            }
        };
        if record.record_type != RecordType::Cname {
            return Err(Error::invalid_input(format!(
                "{hostname} is a {} record, not CNAME",
                record.record_type
            )));
        }

        info!("Removing {} CNAME {:?} (zone {})", hostname, record.values, zone_id);
        self.single_change(hostname, zone_id, RecordChange::delete(record))
            .await
    }

    async fn single_change(
        &self,
        hostname: &str,
        zone_id: &str,
        change: RecordChange,
    ) -> Result<ChangeOutcome> {
        self.transition(hostname, SyncState::ForwardSubmitted);
        let change_id = ChangeWaiter::new(self.provider)
            .submit_and_wait(zone_id, std::slice::from_ref(&change))
            .await?;

        let mut outcome = ChangeOutcome::default();
        outcome.record(zone_id, change_id, change);
        self.transition(hostname, SyncState::Committed);
        Ok(outcome)
    }

    /// Run a compensating mutation after `cause` and decide which error the
    /// caller sees
    async fn compensate<F>(
        &self,
        hostname: &str,
        zone_id: &str,
        cause: Error,
        compensation: F,
    ) -> Error
    where
        F: std::future::Future<Output = Result<ChangeId>>,
    {
        warn!(
            "Reverse step for {} failed ({}), reverting forward change in zone {}",
            hostname, cause, zone_id
        );
        self.transition(hostname, SyncState::Compensating);

        match compensation.await {
            Ok(change_id) => {
                info!("Forward change for {} reverted by {}", hostname, change_id);
                self.transition(hostname, SyncState::RolledBack);
                cause
            }
            Err(compensation_error) => {
                error!(
                    "Could not revert forward change for {} in zone {}: {}",
                    hostname, zone_id, compensation_error
                );
                self.transition(hostname, SyncState::RollbackFailed);
                Error::rollback(cause, compensation_error)
            }
        }
    }

    fn transition(&self, hostname: &str, state: SyncState) {
        debug!("{}: {:?}", hostname, state);

        if let Some(tx) = &self.event_tx {
            let event = SyncEvent {
                hostname: hostname.to_string(),
                state,
            };
            if tx.try_send(event).is_err() {
                warn!("Event channel full or closed, dropping {:?} event for {}", state, hostname);
            }
        }
    }
}

impl ChangeOutcome {
    fn record(&mut self, zone_id: &str, change_id: ChangeId, change: RecordChange) {
        self.applied.push(AppliedChange {
            zone_id: zone_id.to_string(),
            change_id,
            action: change.action,
            record: change.record,
            confirmed_at: Utc::now(),
        });
    }
}

fn first_ipv4(record: &RecordSet) -> Result<Ipv4Addr> {
    let value = record.value().ok_or_else(|| {
        Error::invalid_input(format!("{} has no value", record.name))
    })?;
    value.parse().map_err(|_| {
        Error::invalid_input(format!("{} holds {value}, which is not an IPv4 address", record.name))
    })
}
