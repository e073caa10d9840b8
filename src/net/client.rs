//! WebSocket streaming client for the formant-estimation backend.
//!
//! [`StreamingClient::connect`] spawns a background tokio task that owns the
//! connection for the life of the client:
//!
//! ```text
//! loop {
//!     connect ──ok──▶ serve duplex (chunks out / estimates in)
//!        │                    │ connection lost
//!        │ refused            ▼
//!        └────────────▶ drain stale chunks → sleep → retry
//! }
//! ```
//!
//! The client is the sole owner of [`ConnectionState`]; transitions happen
//! only on transport connect/loss, and are mirrored to observers as
//! [`TransportEvent`]s.
//!
//! Chunk delivery is fire-and-forget, at-most-once: while disconnected, or
//! when the small outbound queue is full, chunks are discarded — stale audio
//! is worthless once superseded, so nothing is ever buffered or retried.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::audio::AudioChunk;
use crate::types::{FormantPoint, SpeakerType};

use super::protocol::{parse_server_message, ClientMessage, ServerMessage};

/// Delay between reconnection attempts.  The contract only requires that the
/// client eventually retries; no backoff is prescribed.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Outbound queue depth.  Deliberately small: a backlog means the link is
/// slower than the chunk rate, and old chunks are better dropped than queued.
const OUTBOUND_QUEUE: usize = 8;

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Whether the streaming connection is currently live.
///
/// Exactly one value at a time; only the transport task transitions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl ConnectionState {
    /// Short label for the status indicator.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connected => "Connected",
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

// ---------------------------------------------------------------------------
// TransportEvent
// ---------------------------------------------------------------------------

/// Events pushed from the transport task to the session controller.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The streaming connection came up.
    Connected,
    /// The streaming connection was lost; reconnection continues in the
    /// background.
    Disconnected,
    /// One formant estimate arrived.
    Formant(FormantPoint),
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// The controller-facing surface of the streaming connection.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn Transport>` between the controller and the chunk forwarder
/// thread.
pub trait Transport: Send + Sync {
    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Transmit one chunk tagged with the selected speaker type.
    ///
    /// Fire-and-forget: never blocks, never errors.  Undeliverable chunks
    /// are silently discarded.
    fn send_chunk(&self, chunk: AudioChunk, speaker: SpeakerType);
}

// ---------------------------------------------------------------------------
// StreamingClient
// ---------------------------------------------------------------------------

struct OutboundChunk {
    samples: Vec<f32>,
    speaker: SpeakerType,
}

/// Handle to the background streaming connection.
///
/// Cheap to share behind an `Arc`; dropping the last handle aborts the
/// transport task and closes the connection.
pub struct StreamingClient {
    chunk_tx: mpsc::Sender<OutboundChunk>,
    connection: Arc<Mutex<ConnectionState>>,
    task: tokio::task::JoinHandle<()>,
}

impl StreamingClient {
    /// Open the streaming connection to `endpoint` (a `ws://…` URL).
    ///
    /// Must be called from within a tokio runtime.  Connection state changes
    /// and formant estimates are delivered over `event_tx`; reconnection is
    /// automatic and continues independently of recording state.
    pub fn connect(endpoint: impl Into<String>, event_tx: mpsc::Sender<TransportEvent>) -> Self {
        let endpoint = endpoint.into();
        let (chunk_tx, chunk_rx) = mpsc::channel(OUTBOUND_QUEUE);
        let connection = Arc::new(Mutex::new(ConnectionState::Disconnected));

        let task = tokio::spawn(run_transport(
            endpoint,
            chunk_rx,
            event_tx,
            Arc::clone(&connection),
        ));

        Self {
            chunk_tx,
            connection,
            task,
        }
    }
}

impl Transport for StreamingClient {
    fn state(&self) -> ConnectionState {
        *self.connection.lock().unwrap()
    }

    fn send_chunk(&self, chunk: AudioChunk, speaker: SpeakerType) {
        if self.state() != ConnectionState::Connected {
            // Undeliverable — discard, never buffer.
            return;
        }

        let outbound = OutboundChunk {
            samples: chunk.samples,
            speaker,
        };
        if self.chunk_tx.try_send(outbound).is_err() {
            log::debug!("audio chunk dropped (transport backlog)");
        }
    }
}

impl Drop for StreamingClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// Transport task
// ---------------------------------------------------------------------------

fn set_state(
    connection: &Arc<Mutex<ConnectionState>>,
    state: ConnectionState,
) {
    *connection.lock().unwrap() = state;
}

async fn run_transport(
    endpoint: String,
    mut chunk_rx: mpsc::Receiver<OutboundChunk>,
    event_tx: mpsc::Sender<TransportEvent>,
    connection: Arc<Mutex<ConnectionState>>,
) {
    loop {
        match connect_async(endpoint.as_str()).await {
            Ok((ws, _response)) => {
                log::info!("streaming connection established: {endpoint}");
                set_state(&connection, ConnectionState::Connected);
                let _ = event_tx.send(TransportEvent::Connected).await;

                serve(ws, &mut chunk_rx, &event_tx).await;

                log::warn!("streaming connection lost: {endpoint}");
                set_state(&connection, ConnectionState::Disconnected);
                let _ = event_tx.send(TransportEvent::Disconnected).await;
            }
            Err(e) => {
                log::warn!("streaming connect failed ({endpoint}): {e}");
            }
        }

        // Anything still queued was produced for a dead connection — stale.
        while chunk_rx.try_recv().is_ok() {}

        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Drive one live connection until it drops or the client is gone.
async fn serve(
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    chunk_rx: &mut mpsc::Receiver<OutboundChunk>,
    event_tx: &mpsc::Sender<TransportEvent>,
) {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            outbound = chunk_rx.recv() => {
                let Some(chunk) = outbound else {
                    // All client handles dropped — shut the connection down.
                    return;
                };
                let msg = ClientMessage::AudioChunk {
                    audio_data: chunk.samples,
                    speaker_type: chunk.speaker,
                };
                let text = match serde_json::to_string(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        log::error!("failed to encode audio chunk: {e}");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    // The chunk is lost; the reconnect loop takes over.
                    return;
                }
            }

            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => handle_frame(&text, event_tx).await,
                    // tungstenite answers pings internally on the next write.
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    // Binary frames are not part of the contract.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn handle_frame(text: &str, event_tx: &mpsc::Sender<TransportEvent>) {
    match parse_server_message(text) {
        Some(ServerMessage::FormantData { f1, f2 }) => {
            let point = FormantPoint::now(f1, f2);
            let _ = event_tx.send(TransportEvent::Formant(point)).await;
        }
        Some(ServerMessage::ConnectionStatus { status }) => {
            log::debug!("backend connection status: {status}");
        }
        Some(ServerMessage::Error { message }) => {
            log::warn!("backend reported error: {message}");
        }
        None => {} // malformed frame, already logged
    }
}

// ---------------------------------------------------------------------------
// MockTransport (test double)
// ---------------------------------------------------------------------------

#[cfg(test)]
pub use mock::MockTransport;


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn state_labels() {
        assert_eq!(ConnectionState::Connected.label(), "Connected");
        assert_eq!(ConnectionState::Disconnected.label(), "Disconnected");
    }

    /// The client must be usable as a trait object.
    #[test]
    fn transport_is_object_safe() {
        let transport: Box<dyn Transport> = Box::new(MockTransport::new(ConnectionState::Connected));
        drop(transport);
    }

    #[tokio::test]
    async fn unreachable_endpoint_stays_disconnected() {
        let (event_tx, _event_rx) = mpsc::channel(4);
        // Nothing listens on this port; the connect attempt fails fast and
        // the client keeps retrying in the background.
        let client = StreamingClient::connect("ws://127.0.0.1:9/ws/formants", event_tx);

        assert_eq!(client.state(), ConnectionState::Disconnected);

        // Fire-and-forget must not panic or block while disconnected.
        client.send_chunk(
            AudioChunk {
                samples: vec![0.0; 4],
            },
            SpeakerType::Male,
        );
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn mock_discards_chunks_while_disconnected() {
        let mock = MockTransport::new(ConnectionState::Disconnected);
        mock.send_chunk(
            AudioChunk {
                samples: vec![0.1; 2],
            },
            SpeakerType::Child,
        );
        assert!(mock.sent_chunks().is_empty());

        mock.set_state(ConnectionState::Connected);
        mock.send_chunk(
            AudioChunk {
                samples: vec![0.2; 2],
            },
            SpeakerType::Child,
        );
        assert_eq!(mock.sent_chunks().len(), 1);
    }
}
