//! Scripted mock switch for integration tests.
//!
//! Speaks just enough of the event socket protocol to drive the
//! subscriber and gateway through their lifecycles: it greets with an
//! auth request, accepts any credential, acknowledges subscriptions,
//! and emits whatever frames the test scripts.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct MockSwitch {
    listener: TcpListener,
    port: u16,
}

impl MockSwitch {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        Self { listener, port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accepts one connection and walks it through the auth exchange.
    pub async fn accept_and_auth(&self) -> TcpStream {
        let (mut stream, _) = self.listener.accept().await.unwrap();
        stream
            .write_all(b"Content-Type: auth/request\n\n")
            .await
            .unwrap();
        let command = read_command(&mut stream).await;
        assert!(command.starts_with("auth "), "expected auth, got {command:?}");
        stream
            .write_all(b"Content-Type: command/reply\nReply-Text: +OK accepted\n\n")
            .await
            .unwrap();
        stream
    }

    /// Accepts one connection and rejects its credential.
    pub async fn accept_and_reject_auth(&self) -> TcpStream {
        let (mut stream, _) = self.listener.accept().await.unwrap();
        stream
            .write_all(b"Content-Type: auth/request\n\n")
            .await
            .unwrap();
        let _ = read_command(&mut stream).await;
        stream
            .write_all(b"Content-Type: command/reply\nReply-Text: -ERR invalid\n\n")
            .await
            .unwrap();
        stream
    }

    /// Accepts one connection and never says anything.
    pub async fn accept_silently(&self) -> TcpStream {
        let (stream, _) = self.listener.accept().await.unwrap();
        stream
    }
}

/// Reads one double-newline-terminated command from the client.
pub async fn read_command(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await.unwrap();
        assert!(n > 0, "peer closed while reading command");
        buf.push(byte[0]);
        if buf.ends_with(b"\n\n") {
            break;
        }
    }
    String::from_utf8(buf).unwrap().trim().to_string()
}

/// Acknowledges an `event plain ...` subscription.
pub async fn expect_subscribe(stream: &mut TcpStream) {
    let command = read_command(stream).await;
    assert!(
        command.starts_with("event plain"),
        "expected subscription, got {command:?}"
    );
    stream
        .write_all(b"Content-Type: command/reply\nReply-Text: +OK event listener enabled plain\n\n")
        .await
        .unwrap();
}

/// Emits one plain-format event frame.
pub async fn send_event(stream: &mut TcpStream, headers: &[(&str, &str)]) {
    let body: String = headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}\n"))
        .collect();
    let frame = format!(
        "Content-Length: {}\nContent-Type: text/event-plain\n\n{body}",
        body.len()
    );
    stream.write_all(frame.as_bytes()).await.unwrap();
}

/// Emits an `api/response` frame with the given body.
pub async fn send_api_response(stream: &mut TcpStream, body: &str) {
    let frame = format!(
        "Content-Length: {}\nContent-Type: api/response\n\n{body}",
        body.len()
    );
    stream.write_all(frame.as_bytes()).await.unwrap();
}

/// Polls `predicate` every 10 ms until it holds or `bound` elapses.
pub async fn wait_for(predicate: impl Fn() -> bool, bound: Duration) {
    let deadline = Instant::now() + bound;
    while Instant::now() < deadline {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within {bound:?}");
}
