//! Minimal embedding example for ptrsync-core
//!
//! Drives the orchestrator against the in-memory provider: one successful
//! A/PTR pair, then a pair whose PTR step is rejected and rolled back.

use ptrsync_core::{
    ChangeOrchestrator, ChangeRequest, Error, MemoryZoneProvider, RecordPages, Result,
    ReverseZonesConfig,
};
use std::net::Ipv4Addr;
use tracing::info;

const REVERSE_ZONES: &str = r#"
[[ReverseHostedZone]]
NetworkCIDR = "10.0.0.0/8"
ZoneName = "10.in-addr.arpa."
"#;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("ptrsync_core=debug,embedded_usage=info")
        .init();

    let provider = MemoryZoneProvider::new();
    provider.add_zone("XYZ789", "example.com.").await;
    provider.add_zone("ABC123", "10.in-addr.arpa.").await;

    let config = ReverseZonesConfig::from_toml_str(REVERSE_ZONES)?;
    let (orchestrator, mut events) = ChangeOrchestrator::from_config(&provider, &config)
        .await?
        .with_event_channel(64);

    let outcome = orchestrator
        .apply(&ChangeRequest::add_a(
            "web.example.com.",
            Ipv4Addr::new(10, 0, 0, 10),
            "example.com",
        ))
        .await?;
    info!("Applied {} change(s)", outcome.applied.len());

    // Reject everything in the reverse zone; the A record must not survive
    provider
        .fail_changes_in_zone("ABC123", Error::provider("memory", "simulated outage"))
        .await;
    let err = orchestrator
        .apply(&ChangeRequest::add_a(
            "db.example.com.",
            Ipv4Addr::new(10, 0, 0, 20),
            "example.com",
        ))
        .await
        .err();
    info!("Second add failed as expected: {:?}", err);
    provider.clear_faults().await;

    while let Ok(event) = events.try_recv() {
        info!("{} -> {:?}", event.hostname, event.state);
    }

    for zone_id in ["XYZ789", "ABC123"] {
        let records = RecordPages::new(&provider, zone_id).collect_all().await?;
        for record in records {
            info!("{}: {} {} {:?}", zone_id, record.record_type, record.name, record.values);
        }
    }

    Ok(())
}
