// # Route 53 Zone Provider
//
// Binds the ptrsync engine to AWS Route 53 hosted zones.
//
// ## Behaviour
//
// - One API call per trait operation; the engine owns sequencing and
//   compensation, this crate never retries
// - Zone IDs are returned without the `/hostedzone/` prefix
// - `wait_for_change` polls GetChange until the change is `INSYNC`, bounded
//   by the configured maximum wait
// - Dry-run mode performs every read, logs change batches instead of
//   submitting them and reports them as already in sync
//
// ## Credentials
//
// Credentials come from the standard AWS provider chain, optionally pinned
// to a named profile. They are never logged.
//
// ## API Reference
//
// - ListHostedZonesByName: closest-match zone listing (DNS order)
// - ListResourceRecordSets: record listing from a `(name, type)` cursor
// - ChangeResourceRecordSets: atomic single-zone change batch
// - GetChange: propagation status (`PENDING` / `INSYNC`)

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_route53::Client;
use aws_sdk_route53::config::Region;
use aws_sdk_route53::types::{
    Change, ChangeAction as SdkChangeAction, ChangeBatch, ChangeStatus, ResourceRecord,
    ResourceRecordSet, RrType,
};
use ptrsync_core::traits::{
    ChangeAction, ChangeId, HostedZone, RecordChange, RecordCursor, RecordSet, RecordSetPage,
    RecordType, ZoneProvider,
};
use ptrsync_core::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const PROVIDER_NAME: &str = "route53";

/// Route 53 is a global service; its API lives in us-east-1
const DEFAULT_REGION: &str = "us-east-1";

/// Default interval between GetChange polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default bound on waiting for a change to reach `INSYNC`
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);

/// Change IDs handed out in dry-run mode start with this prefix
const DRY_RUN_PREFIX: &str = "dryrun-";

/// Connection and behaviour settings for [`Route53Provider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route53Settings {
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
    /// Region override (defaults to the provider chain, then us-east-1)
    pub region: Option<String>,
    /// Endpoint override, e.g. for LocalStack
    pub endpoint_url: Option<String>,
    /// Log change batches instead of submitting them
    pub dry_run: bool,
    /// Interval between GetChange polls
    pub poll_interval: Duration,
    /// Give up waiting for `INSYNC` after this long
    pub max_wait: Duration,
}

impl Default for Route53Settings {
    fn default() -> Self {
        Self {
            profile: None,
            region: None,
            endpoint_url: None,
            dry_run: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

/// Route 53 zone provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is set, the provider will:
/// - Perform all list requests (zone lookup, record lookup)
/// - Build and log each change batch
/// - **NOT** submit it, returning a synthetic change ID that is
///   immediately in sync
pub struct Route53Provider {
    client: Client,
    settings: Route53Settings,
    dry_run_changes: AtomicUsize,
}

// The SDK client carries the resolved credentials provider; keep it out of Debug output
impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("profile", &self.settings.profile)
            .field("region", &self.settings.region)
            .field("endpoint_url", &self.settings.endpoint_url)
            .field("dry_run", &self.settings.dry_run)
            .finish_non_exhaustive()
    }
}

impl Route53Provider {
    /// Load AWS configuration and create the provider
    ///
    /// Credentials are resolved lazily by the SDK on the first request, so
    /// a missing profile surfaces as a provider error from the first call.
    pub async fn new(settings: Route53Settings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let config = loader.load().await;

        let mut builder = aws_sdk_route53::config::Builder::from(&config);
        if config.region().is_none() {
            builder = builder.region(Region::new(DEFAULT_REGION));
        }

        Self::with_client(Client::from_conf(builder.build()), settings)
    }

    /// Create the provider around an existing SDK client
    pub fn with_client(client: Client, settings: Route53Settings) -> Self {
        Self {
            client,
            settings,
            dry_run_changes: AtomicUsize::new(0),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.settings.dry_run
    }
}

#[async_trait]
impl ZoneProvider for Route53Provider {
    async fn list_zones_by_name(&self, name: &str, max_items: u32) -> Result<Vec<HostedZone>> {
        tracing::debug!("ListHostedZonesByName {} (max {})", name, max_items);

        let output = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(name)
            .max_items(to_max_items(max_items))
            .send()
            .await
            .map_err(|e| api_error("ListHostedZonesByName", &e))?;

        Ok(output
            .hosted_zones()
            .iter()
            .map(|zone| HostedZone::new(trim_zone_id(zone.id()), zone.name()))
            .collect())
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordCursor>,
        max_items: Option<u32>,
    ) -> Result<RecordSetPage> {
        tracing::debug!("ListResourceRecordSets {} from {:?}", zone_id, start);

        let mut request = self.client.list_resource_record_sets().hosted_zone_id(zone_id);
        if let Some(cursor) = start {
            request = request.start_record_name(cursor.name.as_str());
            if let Some(record_type) = &cursor.record_type {
                request = request.start_record_type(to_rr_type(record_type));
            }
        }
        if let Some(max_items) = max_items {
            request = request.max_items(to_max_items(max_items));
        }

        let output = request
            .send()
            .await
            .map_err(|e| api_error("ListResourceRecordSets", &e))?;

        let records = output
            .resource_record_sets()
            .iter()
            .map(from_sdk_record_set)
            .collect();
        let next = output.next_record_name().map(|name| RecordCursor {
            name: name.to_string(),
            record_type: output
                .next_record_type()
                .map(|record_type| RecordType::from(record_type.as_str())),
        });

        Ok(RecordSetPage {
            records,
            truncated: output.is_truncated(),
            next,
        })
    }

    async fn change_record_sets(&self, zone_id: &str, changes: &[RecordChange]) -> Result<ChangeId> {
        let sdk_changes = changes
            .iter()
            .map(to_sdk_change)
            .collect::<Result<Vec<_>>>()?;
        let batch = ChangeBatch::builder()
            .set_changes(Some(sdk_changes))
            .build()
            .map_err(build_error)?;

        if self.settings.dry_run {
            let n = self.dry_run_changes.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!(
                "[DRY-RUN] Would submit change batch to zone {}: {}",
                zone_id,
                serde_json::to_string(changes).unwrap_or_default()
            );
            return Ok(ChangeId::new(format!("{DRY_RUN_PREFIX}{n}")));
        }

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| api_error("ChangeResourceRecordSets", &e))?;

        let info = output.change_info().ok_or_else(|| {
            Error::provider(PROVIDER_NAME, "ChangeResourceRecordSets returned no change info")
        })?;
        let change_id = ChangeId::new(trim_change_id(info.id()));
        tracing::info!(
            "Submitted {} change(s) to zone {} as {} ({})",
            changes.len(),
            zone_id,
            change_id,
            info.status().as_str()
        );
        Ok(change_id)
    }

    async fn wait_for_change(&self, change_id: &ChangeId) -> Result<()> {
        if change_id.as_str().starts_with(DRY_RUN_PREFIX) {
            tracing::debug!("[DRY-RUN] {} is in sync", change_id);
            return Ok(());
        }

        let started = Instant::now();
        loop {
            let output = self
                .client
                .get_change()
                .id(change_id.as_str())
                .send()
                .await
                .map_err(|e| api_error("GetChange", &e))?;

            let status = output.change_info().map(|info| info.status().clone());
            if status == Some(ChangeStatus::Insync) {
                tracing::info!("Change {} is in sync", change_id);
                return Ok(());
            }

            if started.elapsed() >= self.settings.max_wait {
                return Err(Error::provider(
                    PROVIDER_NAME,
                    format!(
                        "change {} not in sync after {}s",
                        change_id,
                        self.settings.max_wait.as_secs()
                    ),
                ));
            }

            tracing::debug!(
                "Change {} is {:?}, polling again in {:?}",
                change_id,
                status,
                self.settings.poll_interval
            );
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Strip the `/hostedzone/` prefix Route 53 puts on zone IDs
fn trim_zone_id(id: &str) -> &str {
    id.strip_prefix("/hostedzone/").unwrap_or(id)
}

/// Strip the `/change/` prefix Route 53 puts on change IDs
fn trim_change_id(id: &str) -> &str {
    id.strip_prefix("/change/").unwrap_or(id)
}

fn to_max_items(max_items: u32) -> i32 {
    i32::try_from(max_items).unwrap_or(i32::MAX)
}

fn to_rr_type(record_type: &RecordType) -> RrType {
    RrType::from(record_type.as_str())
}

fn from_sdk_record_set(record_set: &ResourceRecordSet) -> RecordSet {
    RecordSet {
        name: record_set.name().to_string(),
        record_type: RecordType::from(record_set.r#type().as_str()),
        values: record_set
            .resource_records()
            .iter()
            .map(|record| record.value().to_string())
            .collect(),
        ttl: record_set.ttl().and_then(|ttl| u32::try_from(ttl).ok()),
    }
}

fn to_sdk_change(change: &RecordChange) -> Result<Change> {
    let record = &change.record;

    let mut builder = ResourceRecordSet::builder()
        .name(record.name.as_str())
        .r#type(to_rr_type(&record.record_type));
    if let Some(ttl) = record.ttl {
        builder = builder.ttl(i64::from(ttl));
    }
    for value in &record.values {
        let resource_record = ResourceRecord::builder()
            .value(value.as_str())
            .build()
            .map_err(build_error)?;
        builder = builder.resource_records(resource_record);
    }
    let record_set = builder.build().map_err(build_error)?;

    let action = match change.action {
        ChangeAction::Create => SdkChangeAction::Create,
        ChangeAction::Delete => SdkChangeAction::Delete,
    };

    Change::builder()
        .action(action)
        .resource_record_set(record_set)
        .build()
        .map_err(build_error)
}

fn build_error(e: aws_sdk_route53::error::BuildError) -> Error {
    Error::provider(PROVIDER_NAME, format!("invalid change batch: {e}"))
}

fn api_error<E: std::fmt::Display + std::fmt::Debug>(
    operation: &str,
    e: &aws_sdk_route53::error::SdkError<E>,
) -> Error {
    Error::provider(PROVIDER_NAME, format!("{operation}: {}", sdk_error_detail(e)))
}

/// Extract a readable message from an SDK error
fn sdk_error_detail<E: std::fmt::Display + std::fmt::Debug>(
    e: &aws_sdk_route53::error::SdkError<E>,
) -> String {
    use aws_sdk_route53::error::SdkError;

    match e {
        SdkError::ServiceError(service_err) => service_err.err().to_string(),
        SdkError::TimeoutError(_) => "request timed out".to_string(),
        SdkError::DispatchFailure(dispatch_err) => {
            if dispatch_err.is_io() {
                "network error: unable to reach Route 53".to_string()
            } else if dispatch_err.is_timeout() {
                "connection timed out".to_string()
            } else if dispatch_err.is_user() {
                format!("configuration error: {dispatch_err:?}")
            } else {
                format!("connection failed: {dispatch_err:?}")
            }
        }
        SdkError::ConstructionFailure(failure) => format!("could not build request: {failure:?}"),
        SdkError::ResponseError(resp_err) => format!("unexpected response: {resp_err:?}"),
        _ => format!("{e:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dry_run_settings() -> Route53Settings {
        Route53Settings {
            region: Some("us-east-1".to_string()),
            endpoint_url: Some("http://localhost:4566".to_string()),
            dry_run: true,
            ..Route53Settings::default()
        }
    }

    #[test]
    fn test_trim_ids() {
        assert_eq!(trim_zone_id("/hostedzone/Z0123456789"), "Z0123456789");
        assert_eq!(trim_zone_id("Z0123456789"), "Z0123456789");
        assert_eq!(trim_change_id("/change/C2682N5HXP0BZ4"), "C2682N5HXP0BZ4");
        assert_eq!(trim_change_id("C2682N5HXP0BZ4"), "C2682N5HXP0BZ4");
    }

    #[test]
    fn test_default_settings() {
        let settings = Route53Settings::default();
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.max_wait, Duration::from_secs(300));
        assert!(!settings.dry_run);
    }

    #[test]
    fn test_to_sdk_change() {
        let change = RecordChange::create(RecordSet::new(
            "3.2.1.10.in-addr.arpa.",
            RecordType::Ptr,
            "host.example.com.",
            600,
        ));

        let sdk_change = to_sdk_change(&change).unwrap();
        assert_eq!(sdk_change.action(), &SdkChangeAction::Create);

        let record_set = sdk_change.resource_record_set().unwrap();
        assert_eq!(record_set.name(), "3.2.1.10.in-addr.arpa.");
        assert_eq!(record_set.r#type(), &RrType::Ptr);
        assert_eq!(record_set.ttl(), Some(600));
        assert_eq!(record_set.resource_records().len(), 1);
        assert_eq!(record_set.resource_records()[0].value(), "host.example.com.");
    }

    #[test]
    fn test_from_sdk_record_set() {
        let record_set = ResourceRecordSet::builder()
            .name("www.example.com.")
            .r#type(RrType::Cname)
            .ttl(300)
            .resource_records(
                ResourceRecord::builder()
                    .value("host.example.com.")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let record = from_sdk_record_set(&record_set);
        assert_eq!(
            record,
            RecordSet::new("www.example.com.", RecordType::Cname, "host.example.com.", 300)
        );
    }

    #[test]
    fn test_unknown_record_types_pass_through() {
        assert_eq!(to_rr_type(&RecordType::Other("MX".to_string())), RrType::Mx);
        assert_eq!(to_rr_type(&RecordType::A), RrType::A);
    }

    #[tokio::test]
    async fn test_debug_output() {
        let provider = Route53Provider::new(Route53Settings {
            profile: Some("ops".to_string()),
            ..dry_run_settings()
        })
        .await;

        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("Route53Provider"));
        assert!(debug_str.contains("ops"));
        assert!(debug_str.contains("dry_run: true"));
    }

    #[tokio::test]
    async fn test_dry_run_change_is_in_sync_immediately() {
        let provider = Route53Provider::new(dry_run_settings()).await;
        assert!(provider.is_dry_run());
        assert_eq!(provider.provider_name(), "route53");

        let change = RecordChange::create(RecordSet::new(
            "host.example.com.",
            RecordType::A,
            "10.1.2.3",
            600,
        ));
        let first = provider.change_record_sets("XYZ789", &[change.clone()]).await.unwrap();
        let second = provider.change_record_sets("XYZ789", &[change]).await.unwrap();

        assert_ne!(first, second);
        assert!(first.as_str().starts_with(DRY_RUN_PREFIX));
        provider.wait_for_change(&first).await.unwrap();
    }
}
