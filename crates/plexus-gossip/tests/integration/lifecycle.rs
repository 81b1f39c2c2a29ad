//! Coalescing, sender garbage collection, and partition healing.

use std::time::Duration;

use crate::infra::{names, settle, wait_for, Mesh};

#[tokio::test]
async fn rapid_sends_coalesce_on_the_wire() {
    let mesh = Mesh::new();
    let a = mesh.add_peer("01:00:00:01:00:00");
    let b = mesh.add_peer("02:00:00:02:00:00");
    mesh.connect(a.name, b.name);
    settle().await;

    let before = mesh.link(a.name, b.name).delivered();

    // No await between these: the sender worker cannot flush mid-burst.
    a.channel.send_gossip(a.gossiper.insert("one"));
    a.channel.send_gossip(a.gossiper.insert("two"));
    a.channel.send_gossip(a.gossiper.insert("three"));
    settle().await;

    for entry in ["one", "two", "three"] {
        assert!(b.gossiper.contains(entry), "B never learned {entry:?}");
    }
    let frames = mesh.link(a.name, b.name).delivered() - before;
    assert!(
        frames <= 2,
        "burst of three sends produced {frames} frames instead of coalescing"
    );
}

#[tokio::test]
async fn dropped_connections_lose_their_senders_within_one_cycle() {
    let mesh = Mesh::new();
    let a = mesh.add_peer("01:00:00:01:00:00");
    let b = mesh.add_peer("02:00:00:02:00:00");
    let c = mesh.add_peer("03:00:00:03:00:00");
    mesh.connect(a.name, b.name);
    mesh.connect(b.name, c.name);
    settle().await;
    assert_eq!(b.channel.sender_count(), 2);
    assert_eq!(a.channel.sender_count(), 1);

    mesh.disconnect(a.name, b.name);

    // The next gossip round on each side reaps the dead link's sender.
    b.registry.send_all_gossip();
    settle().await;
    assert_eq!(b.channel.sender_count(), 1);

    a.registry.send_all_gossip();
    settle().await;
    assert_eq!(a.channel.sender_count(), 0);
}

#[tokio::test]
async fn partition_heals_and_the_epidemic_terminates() {
    let mesh = Mesh::new();
    let a = mesh.add_peer("01:00:00:01:00:00");
    let b = mesh.add_peer("02:00:00:02:00:00");
    let c = mesh.add_peer("03:00:00:03:00:00");
    mesh.connect(a.name, b.name);
    mesh.connect(b.name, c.name);
    let expected = names(&[&a, &b, &c]);
    wait_for("initial convergence", || {
        [&a, &b, &c]
            .iter()
            .all(|node| node.gossiper.entries() == expected)
    })
    .await;

    // Split A off, then publish on the far side.
    mesh.disconnect(a.name, b.name);
    c.channel.send_gossip(c.gossiper.insert("from-c"));
    settle().await;

    assert!(b.gossiper.contains("from-c"));
    assert!(
        !a.gossiper.contains("from-c"),
        "update crossed a severed link"
    );

    // Heal. The connection-up push carries the update over; A re-gossips
    // its delta back and B recognises it as old news, ending the spread.
    mesh.connect(a.name, b.name);
    wait_for("the update to reach the healed side", || {
        a.gossiper.contains("from-c")
    })
    .await;

    settle().await;
    let quiesced = mesh.total_frames();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        mesh.total_frames(),
        quiesced,
        "gossip kept flowing after convergence"
    );
}
