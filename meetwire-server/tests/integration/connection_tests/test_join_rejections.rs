use meetwire_core::{MeetingCode, ParticipantId};
use meetwire_server::{ConfigError, ENV_PING_INTERVAL_SECS, JoinError, RelayConfig, SignalingService};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{TEST_MEETING, create_test_service, create_test_service_with, init_tracing, test_config};
use crate::utils::{StaticDirectory, TestPeer};

#[tokio::test]
async fn test_blank_ids_are_rejected() {
    init_tracing();

    let service = create_test_service();

    let blank_meeting = service
        .open_session(MeetingCode::from("  "), ParticipantId::from("alice"), None)
        .await;
    assert!(matches!(blank_meeting, Err(JoinError::BlankMeetingCode)));

    let blank_user = service
        .open_session(MeetingCode::from(TEST_MEETING), ParticipantId::from(""), None)
        .await;
    assert!(matches!(blank_user, Err(JoinError::BlankParticipantId)));

    assert_eq!(service.registry().room_count(), 0, "rejected joins create no room");
}

#[tokio::test]
async fn test_inactive_meeting_is_rejected() {
    init_tracing();

    let directory = StaticDirectory::with_meetings(&[TEST_MEETING]);
    let service = create_test_service_with(test_config(), Arc::new(directory.clone()));

    let unknown = service
        .open_session(MeetingCode::from("zzz-zzzz-zzz"), ParticipantId::from("alice"), None)
        .await;
    assert!(matches!(unknown, Err(JoinError::MeetingUnavailable(code)) if code.as_str() == "zzz-zzzz-zzz"));

    let alice = TestPeer::join(&service, TEST_MEETING, "alice").await;
    assert!(alice.is_ok(), "active meeting should accept joins");

    directory.end(TEST_MEETING);
    let bob = TestPeer::join(&service, TEST_MEETING, "bob").await;
    assert!(bob.is_err(), "ended meeting should reject new joins");

    let room = service.registry().room(&TEST_MEETING.into()).expect("room");
    assert_eq!(room.len(), 1);
}

#[tokio::test]
async fn test_service_rejects_invalid_config() {
    init_tracing();

    let zero_ping = RelayConfig {
        ping_interval: Duration::ZERO,
        ..test_config()
    };

    match SignalingService::new(zero_ping) {
        Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, ENV_PING_INTERVAL_SECS),
        Ok(_) => panic!("a zero ping interval must not build a service"),
    }

    let zero_capacity = RelayConfig {
        channel_capacity: 0,
        ..test_config()
    };
    let directory = StaticDirectory::with_meetings(&[TEST_MEETING]);
    assert!(
        SignalingService::with_directory(zero_capacity, Arc::new(directory)).is_err(),
        "a zero channel capacity must not build a service"
    );
}

#[tokio::test]
async fn test_joins_rejected_after_shutdown() {
    init_tracing();

    let service = create_test_service();

    let alice = TestPeer::join(&service, TEST_MEETING, "alice").await.expect("alice join");
    assert_eq!(service.shutdown(), 1);
    assert!(service.is_shutting_down());

    let late = service
        .open_session(MeetingCode::from(TEST_MEETING), ParticipantId::from("bob"), None)
        .await;
    assert!(matches!(late, Err(JoinError::ShuttingDown)));

    let room = service.registry().room(&TEST_MEETING.into()).expect("room");
    assert!(!room.contains(&"bob".into()), "late join must not register");

    alice.leave().await;
    assert_eq!(service.registry().room_count(), 0);
}
