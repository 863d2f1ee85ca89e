//! Submit-and-wait for change batches
//!
//! The waiter is the engine's only suspension point: it submits one
//! single-zone change batch and does not return until the provider reports
//! it in sync. It imposes no timeout of its own.

use crate::error::Result;
use crate::traits::{ChangeId, RecordChange, ZoneProvider};
use tracing::{debug, info};

#[derive(Clone, Copy)]
pub struct ChangeWaiter<'a> {
    provider: &'a dyn ZoneProvider,
}

impl<'a> ChangeWaiter<'a> {
    pub fn new(provider: &'a dyn ZoneProvider) -> Self {
        Self { provider }
    }

    /// Submit `changes` to `zone_id` and block until they have propagated
    ///
    /// Errors from either the submission or the wait are returned unchanged.
    pub async fn submit_and_wait(&self, zone_id: &str, changes: &[RecordChange]) -> Result<ChangeId> {
        for change in changes {
            debug!(
                "{} {} {} in zone {}",
                change.action, change.record.record_type, change.record.name, zone_id
            );
        }

        let change_id = self.provider.change_record_sets(zone_id, changes).await?;
        info!(
            "Submitted change {} to zone {} via {}, waiting for propagation",
            change_id,
            zone_id,
            self.provider.provider_name()
        );

        self.provider.wait_for_change(&change_id).await?;
        info!("Change {} is in sync", change_id);

        Ok(change_id)
    }
}
