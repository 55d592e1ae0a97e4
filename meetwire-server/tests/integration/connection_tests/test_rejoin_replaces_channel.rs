use meetwire_core::SignalKind;
use meetwire_server::CloseReason;

use crate::integration::{TEST_MEETING, create_test_service, init_tracing};
use crate::utils::{TestPeer, offer_to};

#[tokio::test]
async fn test_rejoin_replaces_channel() {
    init_tracing();

    let service = create_test_service();

    let mut stale = TestPeer::join(&service, TEST_MEETING, "alice").await.expect("alice join");
    let mut bob = TestPeer::join(&service, TEST_MEETING, "bob").await.expect("bob join");
    stale.drain();

    let mut fresh = TestPeer::join(&service, TEST_MEETING, "alice").await.expect("alice rejoin");

    assert!(stale.channel().is_closed(), "old channel should be closed");
    assert_eq!(stale.channel().close_reason(), Some(CloseReason::Superseded));
    assert!(!fresh.channel().is_closed());

    let rejoin = bob.recv().await.expect("join for reconnect");
    assert_eq!(rejoin.kind, SignalKind::Join);
    assert_eq!(rejoin.sender_user_id.as_str(), "alice");

    let room = service.registry().room(&TEST_MEETING.into()).expect("room");
    assert_eq!(room.len(), 2, "rejoin must not add a second entry");

    bob.send(&offer_to("alice")).await;

    let offer = fresh.recv().await.expect("offer reaches the new channel");
    assert_eq!(offer.kind, SignalKind::Offer);
    assert_eq!(offer.sender_user_id.as_str(), "bob");
    stale.assert_nothing_received();

    // The superseded connection ending must not evict the replacement.
    stale.close(CloseReason::ClientClosed).await;

    let registered = room.get(&"alice".into()).expect("alice still registered");
    assert!(registered.is_same_connection(fresh.channel()));
    bob.assert_nothing_received();
}
