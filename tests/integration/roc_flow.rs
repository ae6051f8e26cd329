use crate::*;

use flightline_services::{fetch_control_log, visit_control, MapperClient};

/// The full system: Controls register with the Mapper, the aircraft
/// resolves each destination by id and visits them in order.
#[tokio::test]
async fn resolve_via_mapper_then_visit_in_order() {
    let mapper = spawn_mapper().await;
    let bne = spawn_control("Sunny").await;
    let syd = spawn_control("Stormy").await;

    // what controld does at startup for each airport
    let mut registrar = MapperClient::connect(HOST, mapper.port).await.unwrap();
    registrar.register("BNE", bne.port).await.unwrap();
    registrar.register("SYD", syd.port).await.unwrap();
    registrar.lookup("SYD").await.unwrap();
    drop(registrar);

    // roc's resolve phase: one mapper connection, one lookup per id
    let mut resolver = MapperClient::connect(HOST, mapper.port).await.unwrap();
    let mut travel_log = Vec::new();
    for id in ["BNE", "SYD", "BNE"] {
        let port: u16 = resolver
            .lookup(id)
            .await
            .unwrap()
            .expect("registered id should resolve")
            .parse()
            .unwrap();
        travel_log.push(visit_control(HOST, port, "QF1").await.unwrap());
    }

    assert_eq!(travel_log, vec!["Sunny", "Stormy", "Sunny"]);

    // both airports logged the visitor; BNE saw it twice
    assert_eq!(
        fetch_control_log(HOST, bne.port).await.unwrap(),
        vec!["QF1", "QF1"]
    );
    assert_eq!(
        fetch_control_log(HOST, syd.port).await.unwrap(),
        vec!["QF1"]
    );
}

/// A numeric destination is visited directly — no Mapper anywhere.
#[tokio::test]
async fn numeric_destination_needs_no_mapper() {
    let control = spawn_control("Clear").await;

    let info = visit_control(HOST, control.port, "VA323").await.unwrap();
    assert_eq!(info, "Clear");
}

/// Resolving an id nobody registered is the fatal no-map condition —
/// surfaced to roc as a `None` lookup before any visit happens.
#[tokio::test]
async fn unregistered_destination_resolves_to_nothing() {
    let mapper = spawn_mapper().await;

    let mut resolver = MapperClient::connect(HOST, mapper.port).await.unwrap();
    assert_eq!(resolver.lookup("LAX").await.unwrap(), None);
}

/// A visit to a dead destination fails without touching anything else:
/// the remaining destinations are still reachable afterwards.
#[tokio::test]
async fn failed_visit_leaves_other_destinations_reachable() {
    let control = spawn_control("Sunny").await;

    // a port with nothing listening
    let dead = tokio::net::TcpListener::bind((HOST, 0)).await.unwrap();
    let dead_port = dead.local_addr().unwrap().port();
    drop(dead);

    assert!(visit_control(HOST, dead_port, "QF1").await.is_err());

    let info = visit_control(HOST, control.port, "QF1").await.unwrap();
    assert_eq!(info, "Sunny");
    assert_eq!(
        fetch_control_log(HOST, control.port).await.unwrap(),
        vec!["QF1"]
    );
}
