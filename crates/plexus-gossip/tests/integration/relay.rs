//! Unicast relay and spanning-tree broadcast across intermediate hops.

use bytes::Bytes;
use plexus_core::PeerName;

use crate::infra::{settle, Mesh};

#[tokio::test]
async fn unicast_relays_hop_by_hop_to_its_destination() {
    let mesh = Mesh::new();
    let a = mesh.add_peer("01:00:00:01:00:00");
    let b = mesh.add_peer("02:00:00:02:00:00");
    let c = mesh.add_peer("03:00:00:03:00:00");
    mesh.connect(a.name, b.name);
    mesh.connect(b.name, c.name);
    settle().await;

    a.channel
        .gossip_unicast(c.name, Bytes::from_static(b"hello"))
        .unwrap();

    // C hears it once, attributed to the originator, not to B.
    assert_eq!(c.gossiper.unicasts(), vec![(a.name, b"hello".to_vec())]);
    // The intermediate hop forwards without delivering.
    assert!(b.gossiper.unicasts().is_empty());
    assert!(a.gossiper.unicasts().is_empty());
}

#[tokio::test]
async fn unicast_to_an_unreachable_peer_is_dropped() {
    let mesh = Mesh::new();
    let a = mesh.add_peer("01:00:00:01:00:00");
    let b = mesh.add_peer("02:00:00:02:00:00");
    mesh.connect(a.name, b.name);
    settle().await;

    let stranger: PeerName = "0a:0b:0c:0d:0e:0f".parse().unwrap();
    a.channel
        .gossip_unicast(stranger, Bytes::from_static(b"anyone home"))
        .expect("missing route is best-effort, not an error");

    assert!(a.gossiper.unicasts().is_empty());
    assert!(b.gossiper.unicasts().is_empty());
}

#[tokio::test]
async fn broadcast_on_a_line_delivers_once_everywhere() {
    let mesh = Mesh::new();
    let a = mesh.add_peer("01:00:00:01:00:00");
    let b = mesh.add_peer("02:00:00:02:00:00");
    let c = mesh.add_peer("03:00:00:03:00:00");
    mesh.connect(a.name, b.name);
    mesh.connect(b.name, c.name);
    settle().await;

    b.channel.gossip_broadcast(Bytes::from_static(b"x")).unwrap();

    assert_eq!(a.gossiper.broadcasts(), vec![b"x".to_vec()]);
    assert_eq!(c.gossiper.broadcasts(), vec![b"x".to_vec()]);
    // The originator hears no echo of its own broadcast.
    assert!(b.gossiper.broadcasts().is_empty());
}

#[tokio::test]
async fn broadcast_through_a_hub_reaches_each_leaf_exactly_once() {
    let mesh = Mesh::new();
    let hub = mesh.add_peer("02:00:00:02:00:00");
    let a = mesh.add_peer("01:00:00:01:00:00");
    let c = mesh.add_peer("03:00:00:03:00:00");
    let d = mesh.add_peer("04:00:00:04:00:00");
    mesh.connect(hub.name, a.name);
    mesh.connect(hub.name, c.name);
    mesh.connect(hub.name, d.name);
    settle().await;

    a.channel.gossip_broadcast(Bytes::from_static(b"y")).unwrap();

    // The hub delivers once and fans out to the remaining leaves, which
    // are leaves of the tree rooted at A and relay no further.
    for node in [&hub, &c, &d] {
        assert_eq!(node.gossiper.broadcasts(), vec![b"y".to_vec()]);
    }
    assert!(a.gossiper.broadcasts().is_empty());
}
