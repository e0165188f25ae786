//! End-to-end subscriber lifecycle against a scripted in-process peer.

mod common;

use std::time::Duration;

use tokio::io::AsyncReadExt;

use common::{expect_subscribe, send_event, wait_for, MockSwitch};
use eslwatch_daemon::{Subscriber, SubscriberConfig};

#[tokio::test]
async fn streams_events_and_marks_peer_disconnect() {
    let switch = MockSwitch::bind().await;
    let config = SubscriberConfig::new("127.0.0.1", switch.port(), "ClueCon")
        .with_connect_timeout(Duration::from_secs(2))
        // Long enough that no second connection attempt races the
        // assertions below.
        .with_reconnect_delay(Duration::from_secs(30));
    let subscriber = Subscriber::new(config);

    let server = tokio::spawn(async move {
        let mut stream = switch.accept_and_auth().await;
        expect_subscribe(&mut stream).await;
        for i in 0..5 {
            let caller = format!("100{i}");
            send_event(
                &mut stream,
                &[
                    ("Event-Name", "CHANNEL_CREATE"),
                    ("Caller-Caller-ID-Number", caller.as_str()),
                    ("Caller-Destination-Number", "2000"),
                    ("Call-Direction", "inbound"),
                ],
            )
            .await;
        }
        // Dropping the stream here is the peer-side hangup.
    });

    subscriber.start();
    wait_for(
        || subscriber.status().buffer_stats.lifetime_count == 7,
        Duration::from_secs(5),
    )
    .await;
    server.await.unwrap();

    let events = subscriber.events(10);
    assert_eq!(events.len(), 7);
    assert_eq!(events[0].event_type, "SYSTEM");
    assert_eq!(events[0].event_subtype, "CONNECTED");
    for (i, record) in events[1..6].iter().enumerate() {
        assert_eq!(record.event_type, "CHANNEL_CREATE");
        assert_eq!(record.summary, format!("Call inbound: 100{i} -> 2000"));
    }
    assert_eq!(events[6].event_type, "SYSTEM");
    assert_eq!(events[6].event_subtype, "DISCONNECTED");

    let status = subscriber.status();
    assert!(!status.connected);
    assert!(status.running);
    assert!(status.last_event_time.is_some());

    subscriber.stop().await;
    assert!(!subscriber.status().running);
}

#[tokio::test]
async fn failed_connection_sets_error_and_retries() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = SubscriberConfig::new("127.0.0.1", port, "ClueCon")
        .with_connect_timeout(Duration::from_millis(500))
        .with_reconnect_delay(Duration::from_millis(100));
    let subscriber = Subscriber::new(config);
    subscriber.start();

    wait_for(
        || subscriber.status().connection_attempts >= 2,
        Duration::from_secs(5),
    )
    .await;

    let status = subscriber.status();
    assert!(!status.connected);
    assert!(status.running);
    assert!(status.last_error.is_some());

    let events = subscriber.events(100);
    assert!(events.iter().all(|r| r.event_subtype != "CONNECTED"));
    assert!(events
        .iter()
        .any(|r| r.event_type == "SYSTEM" && r.event_subtype == "ERROR"));

    subscriber.stop().await;
    assert!(!subscriber.status().running);
}

#[tokio::test]
async fn stop_ends_an_idle_streaming_session() {
    let switch = MockSwitch::bind().await;
    let config = SubscriberConfig::new("127.0.0.1", switch.port(), "ClueCon")
        .with_connect_timeout(Duration::from_secs(2))
        .with_reconnect_delay(Duration::from_millis(200));
    let subscriber = Subscriber::new(config);

    let server = tokio::spawn(async move {
        let mut stream = switch.accept_and_auth().await;
        expect_subscribe(&mut stream).await;
        // Send nothing; hold the session open until the client hangs up.
        let mut buf = [0u8; 64];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    subscriber.start();
    // A second start while running is a no-op.
    subscriber.start();
    wait_for(|| subscriber.status().connected, Duration::from_secs(5)).await;

    subscriber.stop().await;
    let status = subscriber.status();
    assert!(!status.running);
    assert!(!status.connected);

    // Only the connect marker: a requested stop is not a peer
    // disconnect.
    let events = subscriber.events(10);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_subtype, "CONNECTED");
    server.await.unwrap();
}
