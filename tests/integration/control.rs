use crate::*;

use flightline_services::{fetch_control_log, visit_control};

/// A visit answers with the info line, and the log afterwards contains
/// the visitor.
#[tokio::test]
async fn visit_returns_info_and_is_logged() {
    let control = spawn_control("Sunny").await;

    let info = visit_control(HOST, control.port, "QF1").await.unwrap();
    assert_eq!(info, "Sunny");

    let log = fetch_control_log(HOST, control.port).await.unwrap();
    assert_eq!(log, vec!["QF1"]);
}

/// Repeat visitors get logged once per visit.
#[tokio::test]
async fn repeat_visits_produce_adjacent_duplicates() {
    let control = spawn_control("Foggy").await;

    visit_control(HOST, control.port, "QF1").await.unwrap();
    visit_control(HOST, control.port, "AA1").await.unwrap();
    visit_control(HOST, control.port, "QF1").await.unwrap();

    let log = fetch_control_log(HOST, control.port).await.unwrap();
    assert_eq!(log, vec!["AA1", "QF1", "QF1"]);
}

/// The log dump is in ascending id order whatever the visit order was.
#[tokio::test]
async fn log_dump_is_sorted_by_id() {
    let control = spawn_control("Windy").await;

    for id in ["QF9", "AA1", "BA5"] {
        visit_control(HOST, control.port, id).await.unwrap();
    }

    let log = fetch_control_log(HOST, control.port).await.unwrap();
    assert_eq!(log, vec!["AA1", "BA5", "QF9"]);
}

/// An unvisited Control dumps an empty log.
#[tokio::test]
async fn empty_log_is_just_the_terminator() {
    let control = spawn_control("Quiet").await;

    let log = fetch_control_log(HOST, control.port).await.unwrap();
    assert!(log.is_empty());
}

/// Pin the exact bytes on the wire for both message kinds.
#[tokio::test]
async fn wire_format_is_exact() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let control = spawn_control("Sunny").await;

    let mut stream = tokio::net::TcpStream::connect((HOST, control.port))
        .await
        .unwrap();
    stream.write_all(b"QF1\n").await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert_eq!(response, b"Sunny\n");

    let mut stream = tokio::net::TcpStream::connect((HOST, control.port))
        .await
        .unwrap();
    stream.write_all(b"log\n").await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert_eq!(response, b"QF1\n.\n");
}

/// The worker reads exactly one message: anything sent after the first
/// line is ignored and the connection still closes after the response.
#[tokio::test]
async fn worker_handles_a_single_message_only() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let control = spawn_control("Sunny").await;

    let mut stream = tokio::net::TcpStream::connect((HOST, control.port))
        .await
        .unwrap();
    stream.write_all(b"QF1\nVA9\n").await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert_eq!(response, b"Sunny\n");

    // only the first line was treated as a visit
    let log = fetch_control_log(HOST, control.port).await.unwrap();
    assert_eq!(log, vec!["QF1"]);
}

/// A peer that connects and hangs up without a full line leaves no trace.
#[tokio::test]
async fn half_sent_visit_is_not_recorded() {
    use tokio::io::AsyncWriteExt;

    let control = spawn_control("Sunny").await;

    let mut stream = tokio::net::TcpStream::connect((HOST, control.port))
        .await
        .unwrap();
    stream.write_all(b"QF").await.unwrap();
    stream.shutdown().await.unwrap();
    drop(stream);

    // give the worker a moment to observe the close
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(control.visits.is_empty().await);
}
