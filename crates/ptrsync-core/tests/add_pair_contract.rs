//! Contract Test: Adding an A record together with its PTR record
//!
//! Constraints verified:
//! - After a successful add, both the A record and the PTR record exist
//! - A failed PTR step removes the A record again and returns the PTR error
//! - A failed removal of the A record returns a rollback error with both causes
//! - No covering reverse zone means nothing is written
//! - Records already in either zone are left alone, including during rollback
//!
//! If this test fails, forward and reverse records can drift apart.

mod common;

use common::*;
use ptrsync_core::traits::RecordType;
use ptrsync_core::{ChangeOrchestrator, ChangeRequest, Error, SyncState};
use std::net::{IpAddr, Ipv4Addr};
use tokio_test::{assert_err, assert_ok};

const HOST: &str = "host.example.com.";
const IP: Ipv4Addr = Ipv4Addr::new(10, 1, 2, 3);

#[tokio::test]
async fn add_creates_forward_and_reverse_records() {
    let provider = two_zone_provider().await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    let outcome = assert_ok!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com."))
            .await
    );

    assert_eq!(provider.records(FORWARD_ZONE_ID).await, vec![a_record(HOST, "10.1.2.3")]);
    assert_eq!(
        provider.records(REVERSE_ZONE_ID).await,
        vec![ptr_record("3.2.1.10.in-addr.arpa.", HOST)]
    );

    let zones: Vec<&str> = outcome.applied.iter().map(|c| c.zone_id.as_str()).collect();
    assert_eq!(zones, [FORWARD_ZONE_ID, REVERSE_ZONE_ID]);
    assert!(outcome.applied.iter().all(|c| c.record.ttl == Some(600)));
}

#[tokio::test]
async fn zone_name_without_trailing_dot_resolves_the_same_zone() {
    let provider = two_zone_provider().await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    assert_ok!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com"))
            .await
    );
    assert_eq!(provider.records(FORWARD_ZONE_ID).await.len(), 1);
}

#[tokio::test]
async fn failed_ptr_creation_removes_the_forward_record() {
    let provider = two_zone_provider().await;
    let ptr_error = Error::provider("memory", "InvalidChangeBatch: PTR rejected");
    provider
        .fail_changes_in_zone(REVERSE_ZONE_ID, ptr_error.clone())
        .await;
    let (orchestrator, mut events) =
        ChangeOrchestrator::new(&provider, ten_slash_eight()).with_event_channel(32);

    let err = assert_err!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com."))
            .await
    );

    // The caller sees the PTR error itself, not a rollback error
    assert_eq!(err, ptr_error);
    assert!(provider.records(FORWARD_ZONE_ID).await.is_empty());
    assert!(provider.records(REVERSE_ZONE_ID).await.is_empty());

    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        states.push(event.state);
    }
    assert_eq!(states.last(), Some(&SyncState::RolledBack));
    assert!(states.contains(&SyncState::Compensating));
}

#[tokio::test]
async fn failed_compensation_reports_both_errors() {
    let provider = two_zone_provider().await;
    let ptr_error = Error::provider("memory", "PTR rejected");
    let delete_error = Error::provider("memory", "delete throttled");
    provider
        .fail_changes_in_zone(REVERSE_ZONE_ID, ptr_error.clone())
        .await;
    // 1: create A, 2: create PTR, 3: delete A
    provider.fail_change_attempt(3, delete_error.clone()).await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    let err = assert_err!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com."))
            .await
    );

    assert_eq!(err, Error::rollback(ptr_error.clone(), delete_error));
    assert_eq!(err.root_cause(), &ptr_error);
    // The forward record is left behind, which is what the rollback error reports
    assert_eq!(provider.records(FORWARD_ZONE_ID).await, vec![a_record(HOST, "10.1.2.3")]);
}

#[tokio::test]
async fn uncovered_address_aborts_before_any_mutation() {
    let provider = two_zone_provider().await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());
    let ip = Ipv4Addr::new(172, 21, 4, 15);

    let err = assert_err!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, ip, "example.com."))
            .await
    );

    assert_eq!(err, Error::ReverseZoneNotFound { ip: IpAddr::V4(ip) });
    assert!(provider.submitted_changes().await.is_empty());
}

#[tokio::test]
async fn failed_forward_creation_needs_no_compensation() {
    let provider = two_zone_provider().await;
    let forward_error = Error::provider("memory", "forward rejected");
    provider.fail_change_attempt(1, forward_error.clone()).await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    let err = assert_err!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com."))
            .await
    );

    assert_eq!(err, forward_error);
    assert!(provider.submitted_changes().await.is_empty());
}

#[tokio::test]
async fn existing_forward_record_fails_the_add() {
    let provider = two_zone_provider().await;
    provider
        .insert_record(FORWARD_ZONE_ID, a_record(HOST, "10.9.9.9"))
        .await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    let err = assert_err!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com."))
            .await
    );

    assert!(matches!(err, Error::Provider { .. }));
    let kept = provider
        .find_record(FORWARD_ZONE_ID, HOST, &RecordType::A)
        .await
        .expect("original record untouched");
    assert_eq!(kept.value(), Some("10.9.9.9"));
    assert!(provider.records(REVERSE_ZONE_ID).await.is_empty());
}

#[tokio::test]
async fn unknown_zone_is_reported() {
    let provider = two_zone_provider().await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    let err = assert_err!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.org."))
            .await
    );

    assert!(matches!(err, Error::ZoneNotFound { .. }));
}

#[tokio::test]
async fn add_in_populated_zones_keeps_the_neighbours() {
    let provider = two_zone_provider().await;
    insert_earlier_neighbours(&provider).await;
    insert_later_neighbours(&provider).await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    assert_ok!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com."))
            .await
    );

    assert_eq!(
        provider.records(FORWARD_ZONE_ID).await,
        vec![
            a_record("app.example.com.", "10.0.0.5"),
            a_record(HOST, "10.1.2.3"),
            a_record("www.example.com.", "10.9.9.9"),
        ]
    );
    assert_eq!(
        provider.records(REVERSE_ZONE_ID).await,
        vec![
            ptr_record("5.0.0.10.in-addr.arpa.", "app.example.com."),
            ptr_record("3.2.1.10.in-addr.arpa.", HOST),
            ptr_record("9.9.9.10.in-addr.arpa.", "www.example.com."),
        ]
    );
}

#[tokio::test]
async fn failed_ptr_creation_with_later_records_still_rolls_back() {
    let provider = two_zone_provider().await;
    provider
        .insert_record(FORWARD_ZONE_ID, a_record("www.example.com.", "10.9.9.9"))
        .await;
    let ptr_error = Error::provider("memory", "PTR rejected");
    provider
        .fail_changes_in_zone(REVERSE_ZONE_ID, ptr_error.clone())
        .await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    let err = assert_err!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com."))
            .await
    );

    assert_eq!(err, ptr_error);
    assert_eq!(
        provider.records(FORWARD_ZONE_ID).await,
        vec![a_record("www.example.com.", "10.9.9.9")]
    );
}

#[tokio::test]
async fn failed_ptr_creation_in_populated_zones_removes_only_the_new_record() {
    let provider = two_zone_provider().await;
    insert_earlier_neighbours(&provider).await;
    insert_later_neighbours(&provider).await;
    let ptr_error = Error::provider("memory", "PTR rejected");
    // 1: create A, 2: create PTR
    provider.fail_change_attempt(2, ptr_error.clone()).await;
    let orchestrator = ChangeOrchestrator::new(&provider, ten_slash_eight());

    let err = assert_err!(
        orchestrator
            .apply(&ChangeRequest::add_a(HOST, IP, "example.com."))
            .await
    );

    assert_eq!(err, ptr_error);
    assert!(!err.is_rollback());
    assert_eq!(
        provider.records(FORWARD_ZONE_ID).await,
        vec![
            a_record("app.example.com.", "10.0.0.5"),
            a_record("www.example.com.", "10.9.9.9"),
        ]
    );
    assert_eq!(provider.records(REVERSE_ZONE_ID).await.len(), 2);
}
