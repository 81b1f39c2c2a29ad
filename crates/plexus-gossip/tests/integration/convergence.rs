//! State convergence across a line topology, with and without the
//! periodic driver.

use std::time::Duration;

use tokio::sync::broadcast;

use plexus_gossip::driver::gossip_loop;

use crate::infra::{names, settle, wait_for, Mesh};

#[tokio::test]
async fn line_topology_converges_on_connection_push() {
    let mesh = Mesh::new();
    let a = mesh.add_peer("01:00:00:01:00:00");
    let b = mesh.add_peer("02:00:00:02:00:00");
    let c = mesh.add_peer("03:00:00:03:00:00");

    mesh.connect(a.name, b.name);
    settle().await;
    // B learns of A the moment the connection comes up.
    assert_eq!(b.gossiper.entries(), names(&[&a, &b]));
    assert_eq!(a.gossiper.entries(), names(&[&a, &b]));

    mesh.connect(b.name, c.name);
    let expected = names(&[&a, &b, &c]);
    wait_for("every peer to see {A, B, C}", || {
        [&a, &b, &c]
            .iter()
            .all(|node| node.gossiper.entries() == expected)
    })
    .await;
}

#[tokio::test]
async fn periodic_driver_converges_a_quiet_mesh() {
    let mesh = Mesh::new();
    let a = mesh.add_peer("01:00:00:01:00:00");
    let b = mesh.add_peer("02:00:00:02:00:00");
    let c = mesh.add_peer("03:00:00:03:00:00");

    // No connection-up push: the interval timer has to do all the work.
    mesh.connect_quiet(a.name, b.name);
    mesh.connect_quiet(b.name, c.name);

    let (shutdown_tx, _) = broadcast::channel(1);
    let mut drivers = Vec::new();
    for node in [&a, &b, &c] {
        drivers.push(tokio::spawn(gossip_loop(
            node.registry.clone(),
            Duration::from_millis(20),
            shutdown_tx.subscribe(),
        )));
    }

    let expected = names(&[&a, &b, &c]);
    wait_for("the driver to converge every peer", || {
        [&a, &b, &c]
            .iter()
            .all(|node| node.gossiper.entries() == expected)
    })
    .await;

    shutdown_tx.send(()).unwrap();
    for driver in drivers {
        tokio::time::timeout(Duration::from_secs(1), driver)
            .await
            .expect("driver did not shut down")
            .expect("driver task panicked")
            .expect("driver returned an error");
    }
}
