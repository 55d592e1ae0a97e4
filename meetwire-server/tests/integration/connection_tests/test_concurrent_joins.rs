use futures::future::join_all;
use meetwire_server::{CloseReason, RelayConfig};
use std::collections::HashSet;

use crate::integration::{
    TEST_MEETING, create_test_service, create_test_service_with_config, init_tracing, test_config,
};
use crate::utils::TestPeer;

const PEER_COUNT: usize = 100;

/// Every peer must be able to buffer a join from all the others unread.
fn roomy_config() -> RelayConfig {
    RelayConfig {
        channel_capacity: PEER_COUNT * 2,
        ..test_config()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins() {
    init_tracing();

    let service = create_test_service_with_config(roomy_config());

    let joins = (0..PEER_COUNT).map(|i| {
        let service = service.clone();
        tokio::spawn(async move { TestPeer::join(&service, TEST_MEETING, &format!("peer-{}", i)).await })
    });

    let peers: Vec<TestPeer> = join_all(joins)
        .await
        .into_iter()
        .map(|joined| joined.expect("join task panicked").expect("join failed"))
        .collect();

    let room = service.registry().room(&TEST_MEETING.into()).expect("room");
    assert_eq!(room.len(), PEER_COUNT, "no concurrent join may be lost");

    let unique: HashSet<_> = room.participant_ids().into_iter().collect();
    assert_eq!(unique.len(), PEER_COUNT);
    assert_eq!(service.registry().room_count(), 1, "all joins share one room");

    for peer in &peers {
        assert_ne!(
            peer.channel().close_reason(),
            Some(CloseReason::SendFailed),
            "{} was evicted instead of joining",
            peer.id()
        );
        assert!(!peer.channel().is_closed(), "{} should still be open", peer.id());
    }

    let leaves = peers.into_iter().map(|peer| tokio::spawn(peer.leave()));
    for left in join_all(leaves).await {
        left.expect("leave task panicked");
    }

    assert_eq!(service.registry().room_count(), 0);
    assert_eq!(service.registry().participant_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_join_racing_last_leave() {
    init_tracing();

    let service = create_test_service();

    for round in 0..50 {
        let leaving = TestPeer::join(&service, TEST_MEETING, "leaving").await.expect("join");

        let joiner = {
            let service = service.clone();
            tokio::spawn(async move {
                TestPeer::join(&service, TEST_MEETING, &format!("joiner-{}", round)).await
            })
        };
        let leaver = tokio::spawn(leaving.leave());

        leaver.await.expect("leave task panicked");
        let joined = joiner.await.expect("join task panicked").expect("join failed");

        let room = service
            .registry()
            .room(&TEST_MEETING.into())
            .expect("the joiner's room must survive the race");
        assert!(room.contains(joined.id()), "round {}: joiner lost", round);

        joined.leave().await;
        assert_eq!(service.registry().room_count(), 0);
    }
}
