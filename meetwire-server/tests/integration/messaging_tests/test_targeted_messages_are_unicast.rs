use meetwire_core::{ParticipantId, SignalKind, SignalMessage};

use crate::integration::{TEST_MEETING, create_test_service, init_tracing};
use crate::utils::{TEST_SDP_ANSWER, TEST_SDP_OFFER, TestPeer, answer_to, candidate_to, offer_to};

#[tokio::test]
async fn test_targeted_messages_are_unicast() {
    init_tracing();

    let service = create_test_service();

    let mut alice = TestPeer::join(&service, TEST_MEETING, "alice").await.expect("alice join");
    let mut bob = TestPeer::join(&service, TEST_MEETING, "bob").await.expect("bob join");
    let mut carol = TestPeer::join(&service, TEST_MEETING, "carol").await.expect("carol join");
    alice.drain();
    bob.drain();

    alice.send(&offer_to("bob")).await;

    let offer = bob.recv().await.expect("offer for bob");
    assert_eq!(offer.kind, SignalKind::Offer);
    assert_eq!(offer.sdp.as_deref(), Some(TEST_SDP_OFFER));
    assert_eq!(offer.sender_user_id.as_str(), "alice");
    assert_eq!(offer.meeting_code.as_str(), TEST_MEETING);
    assert_eq!(offer.target_user_id, Some(ParticipantId::from("bob")));
    alice.assert_nothing_received();
    carol.assert_nothing_received();

    bob.send(&answer_to("alice")).await;

    let answer = alice.recv().await.expect("answer for alice");
    assert_eq!(answer.kind, SignalKind::Answer);
    assert_eq!(answer.sdp.as_deref(), Some(TEST_SDP_ANSWER));
    assert_eq!(answer.sender_user_id.as_str(), "bob");
    carol.assert_nothing_received();

    carol.send(&candidate_to("alice", 3)).await;

    let candidate = alice.recv().await.expect("candidate for alice");
    assert_eq!(candidate.kind, SignalKind::Candidate);
    assert_eq!(candidate.sender_user_id.as_str(), "carol");
    assert_eq!(candidate.sdp_mid.as_deref(), Some("0"));
    assert_eq!(candidate.sdp_m_line_index, Some(3));
    assert!(
        candidate.candidate.as_deref().is_some_and(|c| c.starts_with("candidate:3")),
        "candidate line should be relayed unchanged"
    );
    bob.assert_nothing_received();
}

#[tokio::test]
async fn test_unknown_or_missing_target_is_dropped() {
    init_tracing();

    let service = create_test_service();

    let mut alice = TestPeer::join(&service, TEST_MEETING, "alice").await.expect("alice join");
    let mut bob = TestPeer::join(&service, TEST_MEETING, "bob").await.expect("bob join");
    alice.drain();

    alice.send(&offer_to("nobody")).await;

    let mut untargeted = SignalMessage::new(SignalKind::Answer);
    untargeted.sdp = Some(TEST_SDP_ANSWER.to_owned());
    alice.send(&untargeted).await;

    let mut blank_target = offer_to("");
    blank_target.target_user_id = Some(ParticipantId::from("   "));
    alice.send(&blank_target).await;

    alice.assert_nothing_received();
    bob.assert_nothing_received();

    let room = service.registry().room(&TEST_MEETING.into()).expect("room");
    assert_eq!(room.len(), 2, "dropped messages must not disturb the room");
}

#[tokio::test]
async fn test_peer_in_other_meeting_is_unreachable() {
    init_tracing();

    let service = create_test_service();

    let alice = TestPeer::join(&service, TEST_MEETING, "alice").await.expect("alice join");
    let mut bob = TestPeer::join(&service, "other-meeting", "bob").await.expect("bob join");

    alice.send(&offer_to("bob")).await;

    bob.assert_nothing_received();
    assert_eq!(service.registry().room_count(), 2);
}
