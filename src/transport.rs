//! WebSocket transport connector - persistent channel to the event source
//!
//! Owns the connection for the lifetime of the session and retries
//! indefinitely with capped exponential backoff plus jitter. The consumer is
//! never blocked by connection state: inbound frames are handed off through a
//! bounded mpsc channel and the connection state is observable via a watch
//! channel.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use crate::backoff::RetryConfig;
use crate::notification::event::WireMessage;

/// Connection state, owned by the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Reconnecting,
}

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:4000/events`
    pub endpoint: String,
    /// Reconnection backoff policy (retries forever, `max_retries` unused)
    pub reconnect: RetryConfig,
}

/// Why a single connection's read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PumpOutcome {
    /// The peer went away or the read failed; reconnect.
    Disconnected,
    /// The events receiver was dropped; the session is gone, stop for good.
    ConsumerGone,
}

/// Handle to the background connection task.
pub struct Connector {
    task: JoinHandle<()>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl Connector {
    /// Spawn the connection task. All inbound messages go through
    /// `events_tx`; the same sender is reused across reconnects, so there is
    /// exactly one delivery path no matter how many times the link drops.
    pub fn spawn(config: TransportConfig, events_tx: mpsc::Sender<WireMessage>) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let state_tx = Arc::new(state_tx);
        let task = tokio::spawn(run(config, events_tx, state_tx.clone()));
        Self {
            task,
            state_tx,
            state_rx,
        }
    }

    /// Observe connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Tear the connection down. Safe to call more than once.
    pub fn shutdown(&self) {
        self.task.abort();
        let _ = self.state_tx.send(ConnectionState::Closed);
    }
}

async fn run(
    config: TransportConfig,
    events_tx: mpsc::Sender<WireMessage>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
) {
    let mut attempt = 0u32;
    loop {
        let _ = state_tx.send(if attempt == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting
        });

        match connect_async(config.endpoint.as_str()).await {
            Ok((mut stream, _response)) => {
                info!(endpoint = %config.endpoint, "transport connected");
                let _ = state_tx.send(ConnectionState::Open);
                attempt = 0;
                match pump(&mut stream, &events_tx).await {
                    PumpOutcome::Disconnected => warn!("transport disconnected"),
                    PumpOutcome::ConsumerGone => {
                        let _ = state_tx.send(ConnectionState::Closed);
                        return;
                    }
                }
            }
            Err(e) => warn!(error = %e, "transport connect failed"),
        }

        attempt = attempt.saturating_add(1);
        let delay = config.reconnect.delay_with_jitter(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
        tokio::time::sleep(delay).await;
    }
}

/// Read loop for one connection. Text frames are parsed into [`WireMessage`]
/// and forwarded; unparseable frames are ignored. Ping frames get a pong.
async fn pump<S>(stream: &mut S, events_tx: &mpsc::Sender<WireMessage>) -> PumpOutcome
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<WireMessage>(&text) {
                Ok(msg) => {
                    if events_tx.send(msg).await.is_err() {
                        return PumpOutcome::ConsumerGone;
                    }
                }
                Err(e) => debug!(error = %e, "ignoring unparseable frame"),
            },
            Ok(Message::Ping(data)) => {
                let _ = stream.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                info!("server closed the connection");
                return PumpOutcome::Disconnected;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "transport read failed");
                return PumpOutcome::Disconnected;
            }
        }
    }
    PumpOutcome::Disconnected
}
