//! Per-session realtime channel.
//!
//! A background task owns the WebSocket, decodes inbound text frames into
//! [`CrewEvent`]s and forwards them in arrival order over a flume channel.
//! The connection lifecycle is published on a `watch` channel:
//!
//! ```text
//! Connecting -> Open -> Closed
//!     |           \
//!     +------------+--> Failed(reason)
//! ```
//!
//! With `max_reconnects > 0` a failed connection goes back to `Connecting`
//! after `reconnect_delay_ms`, up to that many times. A clean close from the
//! server is never retried.

use std::sync::Arc;
use std::time::Duration;

use crew_api_types::CrewEvent;
use crew_core::config::RealtimeConfig;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Failed(String),
}

impl ConnectionState {
    /// Anything but `Connecting`.
    pub fn is_settled(&self) -> bool {
        !matches!(self, ConnectionState::Connecting)
    }
}

pub struct RealtimeChannel {
    url: String,
    state: watch::Receiver<ConnectionState>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    events: flume::Receiver<CrewEvent>,
    reader: JoinHandle<()>,
}

impl RealtimeChannel {
    /// Open the channel in the background. Must be called inside a tokio
    /// runtime; the returned handle starts in `Connecting`.
    pub fn connect(url: impl Into<String>, retry: &RealtimeConfig) -> Self {
        let url = url.into();
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let state_tx = Arc::new(state_tx);
        let (tx, events) = flume::unbounded();

        let reader = tokio::spawn(run_reader(
            url.clone(),
            retry.clone(),
            tx,
            Arc::clone(&state_tx),
        ));

        Self {
            url,
            state,
            state_tx,
            events,
            reader,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Wait until the first connection attempt settles and return the
    /// resulting state.
    pub async fn ready(&self) -> ConnectionState {
        let mut rx = self.state.clone();
        let settled = match rx.wait_for(ConnectionState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Next buffered event, if any, without waiting.
    pub fn try_recv(&self) -> Option<CrewEvent> {
        self.events.try_recv().ok()
    }

    /// Next event; `None` once the channel is closed and drained.
    pub async fn recv(&self) -> Option<CrewEvent> {
        self.events.recv_async().await.ok()
    }

    /// Stop reading. Events already buffered can still be drained.
    pub fn close(&self) {
        self.reader.abort();
        self.state_tx.send_replace(ConnectionState::Closed);
        tracing::debug!(url = %self.url, "realtime channel closed");
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for RealtimeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeChannel")
            .field("url", &self.url)
            .field("state", &*self.state.borrow())
            .field("buffered", &self.events.len())
            .finish()
    }
}

async fn run_reader(
    url: String,
    retry: RealtimeConfig,
    tx: flume::Sender<CrewEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    let mut attempts = 0u32;
    loop {
        state.send_replace(ConnectionState::Connecting);

        let failure = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                tracing::info!(url = %url, "realtime channel open");
                state.send_replace(ConnectionState::Open);
                match read_frames(stream, &tx).await {
                    Ok(()) => {
                        tracing::info!(url = %url, "realtime channel closed by server");
                        state.send_replace(ConnectionState::Closed);
                        return;
                    }
                    Err(reason) => reason,
                }
            }
            Err(e) => e.to_string(),
        };

        if attempts >= retry.max_reconnects || tx.is_disconnected() {
            tracing::warn!(url = %url, error = %failure, "realtime channel failed");
            state.send_replace(ConnectionState::Failed(failure));
            return;
        }
        attempts += 1;
        tracing::warn!(
            url = %url,
            error = %failure,
            attempt = attempts,
            max = retry.max_reconnects,
            "realtime channel dropped, reconnecting"
        );
        tokio::time::sleep(Duration::from_millis(retry.reconnect_delay_ms)).await;
    }
}

/// Pump frames until the server closes (`Ok`) or the transport errors.
async fn read_frames(
    mut stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    tx: &flume::Sender<CrewEvent>,
) -> Result<(), String> {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if let Some(event) = decode_frame(text.as_str()) {
                    if tx.send(event).is_err() {
                        // Nobody is listening any more.
                        return Ok(());
                    }
                }
            }
            Ok(Message::Close(_)) => return Ok(()),
            Ok(Message::Binary(_)) => tracing::debug!("ignoring binary realtime frame"),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
    Ok(())
}

fn decode_frame(text: &str) -> Option<CrewEvent> {
    match CrewEvent::from_json(text) {
        Ok(mut event) => {
            event.stamp_receipt(chrono::Utc::now());
            Some(event)
        }
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed realtime frame");
            None
        }
    }
}
