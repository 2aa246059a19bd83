//! WsTransport: relays events to the host over a WebSocket.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use teleplay_core::{decode_message, encode_message, Event, Sender, WireMessage};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::application::relay::{Transport, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// WebSocket client connection to a host.
pub struct WsTransport {
    url: String,
    sink: Mutex<Option<WsSink>>,
    open: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    /// Creates an unconnected transport for `url` (`ws://host:port/path`).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sink: Mutex::new(None),
            open: Arc::new(AtomicBool::new(false)),
            reader: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the link is up as far as this side knows.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn connect_error(&self, err: WsError) -> TransportError {
        match err {
            WsError::Io(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                TransportError::ConnectionRefused(self.url.clone())
            }
            other => TransportError::Connect {
                addr: self.url.clone(),
                reason: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, role: Sender) -> Result<(), TransportError> {
        let (stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| self.connect_error(e))?;
        let (mut sink, stream) = stream.split();

        let hello = encode_message(&WireMessage::hello(role))?;
        sink.send(Message::Text(hello))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        self.open.store(true, Ordering::Release);
        *self.sink.lock().await = Some(sink);
        *self.reader.lock().await = Some(tokio::spawn(read_until_closed(stream, Arc::clone(&self.open))));
        info!("connected to {} as {role}", self.url);
        Ok(())
    }

    async fn send(&self, event: &Event) -> Result<bool, TransportError> {
        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        if !self.is_open() {
            return Ok(false);
        }

        let text = encode_message(&WireMessage::Event(event.clone()))?;
        sink.send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(true)
    }

    async fn stop(&self) {
        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            if self.open.swap(false, Ordering::AcqRel) {
                if let Ok(goodbye) = encode_message(&WireMessage::Goodbye) {
                    let _ = sink.send(Message::Text(goodbye)).await;
                }
            }
            if let Err(e) = sink.close().await {
                debug!("close frame not delivered: {e}");
            }
            info!("disconnected from {}", self.url);
        }
        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }
    }
}

async fn read_until_closed(mut stream: SplitStream<WsStream>, open: Arc<AtomicBool>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match decode_message(&text) {
                Ok(WireMessage::Goodbye) => {
                    info!("host said goodbye");
                    break;
                }
                Ok(msg) => debug!("ignoring message from host: {msg:?}"),
                Err(e) => warn!("unreadable message from host: {e}"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("connection to host lost: {e}");
                break;
            }
        }
    }
    open.store(false, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use teleplay_core::{EventName, Key};
    use tokio::net::TcpListener;

    async fn next_message(server: &mut WebSocketStream<TcpStream>) -> WireMessage {
        loop {
            match server.next().await {
                Some(Ok(Message::Text(text))) => return decode_message(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_is_refused() {
        // Arrange: find a free port, then close it again
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let transport = WsTransport::new(format!("ws://127.0.0.1:{port}/"));

        // Act
        let result = transport.connect(Sender::Player).await;

        // Assert
        assert!(matches!(result, Err(TransportError::ConnectionRefused(_))));
    }

    #[tokio::test]
    async fn test_send_before_connect_is_not_connected() {
        let transport = WsTransport::new("ws://127.0.0.1:1/");
        let event = Event::new(EventName::OnPress, Sender::Player, Key::A);

        let result = transport.send(&event).await;

        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn test_hello_event_goodbye_sequence() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let mut received = Vec::new();
            for _ in 0..3 {
                received.push(next_message(&mut ws).await);
            }
            received
        });
        let transport = WsTransport::new(format!("ws://127.0.0.1:{port}/"));

        // Act
        transport.connect(Sender::Player).await.unwrap();
        let sent = transport
            .send(&Event::new(EventName::OnPress, Sender::Player, Key::W))
            .await
            .unwrap();
        transport.stop().await;
        transport.stop().await;

        // Assert
        assert!(sent);
        let received = server.await.unwrap();
        assert!(matches!(received[0], WireMessage::Hello { role: Sender::Player, .. }));
        assert_eq!(
            received[1],
            WireMessage::Event(Event::new(EventName::OnPress, Sender::Player, Key::W))
        );
        assert_eq!(received[2], WireMessage::Goodbye);
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_send_after_host_goodbye_returns_false() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let _hello = next_message(&mut ws).await;
            let goodbye = encode_message(&WireMessage::Goodbye).unwrap();
            ws.send(Message::Text(goodbye)).await.unwrap();
            ws
        });
        let transport = WsTransport::new(format!("ws://127.0.0.1:{port}/"));
        transport.connect(Sender::Player).await.unwrap();
        let _ws = server.await.unwrap();

        // Act: wait for the reader to notice
        for _ in 0..50 {
            if !transport.is_open() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let sent = transport
            .send(&Event::new(EventName::OnRelease, Sender::Player, Key::W))
            .await
            .unwrap();

        // Assert
        assert!(!sent);
    }
}
