use crate::*;

use flightline_services::MapperClient;

/// Register an airport, look it up, get the port back.
#[tokio::test]
async fn add_airport_then_port_request_round_trip() {
    let mapper = spawn_mapper().await;

    let mut client = MapperClient::connect(HOST, mapper.port).await.unwrap();
    client.register("BNE", 4000).await.unwrap();

    // same connection — the lookup is ordered after the registration
    let port = client.lookup("BNE").await.unwrap();
    assert_eq!(port.as_deref(), Some("4000"));
}

/// An unknown id on an empty registry answers with the not-found sentinel.
#[tokio::test]
async fn port_request_for_unknown_id_is_not_found() {
    let mapper = spawn_mapper().await;

    let mut client = MapperClient::connect(HOST, mapper.port).await.unwrap();
    assert_eq!(client.lookup("ZZZ").await.unwrap(), None);
}

/// Registering an id twice keeps the first registration.
#[tokio::test]
async fn duplicate_registration_is_a_no_op() {
    let mapper = spawn_mapper().await;

    let mut client = MapperClient::connect(HOST, mapper.port).await.unwrap();
    client.register("BNE", 4000).await.unwrap();
    client.register("BNE", 9999).await.unwrap();

    assert_eq!(client.lookup("BNE").await.unwrap().as_deref(), Some("4000"));
    assert_eq!(mapper.directory.len().await, 1);
}

/// The directory dump comes back in ascending id order regardless of
/// registration order.
#[tokio::test]
async fn directory_dump_is_sorted_by_id() {
    let mapper = spawn_mapper().await;

    let mut client = MapperClient::connect(HOST, mapper.port).await.unwrap();
    client.register("SYD", 5000).await.unwrap();
    client.register("BNE", 4000).await.unwrap();
    client.register("ADL", 6000).await.unwrap();
    // lookup forces the registrations through before the second connection
    client.lookup("ADL").await.unwrap();

    let entries = MapperClient::connect(HOST, mapper.port)
        .await
        .unwrap()
        .directory()
        .await
        .unwrap();
    assert_eq!(
        entries,
        vec![
            ("ADL".to_string(), "6000".to_string()),
            ("BNE".to_string(), "4000".to_string()),
            ("SYD".to_string(), "5000".to_string()),
        ]
    );
}

/// An empty registry dumps nothing — no lines, no terminator.
#[tokio::test]
async fn empty_directory_dump_has_no_lines() {
    let mapper = spawn_mapper().await;

    let entries = MapperClient::connect(HOST, mapper.port)
        .await
        .unwrap()
        .directory()
        .await
        .unwrap();
    assert!(entries.is_empty());
}

/// One connection carries many requests; the worker must not assume
/// one message per connection.
#[tokio::test]
async fn connection_carries_many_requests() {
    let mapper = spawn_mapper().await;

    let mut client = MapperClient::connect(HOST, mapper.port).await.unwrap();
    for (id, port) in [("SYD", 5000), ("BNE", 4000), ("ADL", 6000)] {
        client.register(id, port).await.unwrap();
        assert_eq!(
            client.lookup(id).await.unwrap(),
            Some(port.to_string()),
            "{id} should resolve right after registration"
        );
    }
    assert_eq!(mapper.directory.len().await, 3);
}

/// A protocol violation closes the connection without a response, and the
/// service keeps serving other connections.
#[tokio::test]
async fn unknown_type_byte_closes_the_connection_silently() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mapper = spawn_mapper().await;

    let mut stream = tokio::net::TcpStream::connect((HOST, mapper.port))
        .await
        .unwrap();
    stream.write_all(b"xBNE\n").await.unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty(), "no response expected, got {rest:?}");

    // the listener is still alive
    let mut client = MapperClient::connect(HOST, mapper.port).await.unwrap();
    assert_eq!(client.lookup("BNE").await.unwrap(), None);
}

/// With a bounded worker gate, a second connection waits for the first
/// worker's slot instead of being served concurrently.
#[tokio::test]
async fn bounded_gate_defers_the_second_connection() {
    use std::time::Duration;

    let mapper = spawn_mapper_with(WorkerPolicy::Bounded(1)).await;

    // occupies the only slot by staying connected and silent
    let idle = tokio::net::TcpStream::connect((HOST, mapper.port))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut client = MapperClient::connect(HOST, mapper.port).await.unwrap();
    let stalled = tokio::time::timeout(Duration::from_millis(100), client.lookup("BNE")).await;
    assert!(stalled.is_err(), "second worker should wait for a slot");

    drop(idle);
    let answered = tokio::time::timeout(Duration::from_secs(2), client.lookup("BNE"))
        .await
        .expect("slot should free up once the idle connection closes")
        .unwrap();
    assert_eq!(answered, None);
}
