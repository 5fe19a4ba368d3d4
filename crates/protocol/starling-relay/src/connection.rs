//! One gossip connection's read/write loop (§4.4, §5).
//!
//! Message handling within a connection is sequential by construction: the
//! `tokio::select!` loop below only ever has one branch's body running at a
//! time, so a slow write gate call naturally orders behind the inbound
//! frame that triggered it. Different connections run as independent
//! tasks and never share this loop's state.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use starling_store::EventStore;
use starling_types::constants;
use starling_wire::gossip::{ClientMessage, RelayMessage};
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::subscription::{Broadcaster, ConnectionSubscriptions};
use crate::write_gate::{should_broadcast, PaymentContext, WriteGate, WriteOutcome};

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub max_message_size: usize,
    pub idle_timeout: Duration,
    pub max_subscriptions: usize,
    pub max_filters_per_sub: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_message_size: 512 * 1024,
            idle_timeout: Duration::from_secs(300),
            max_subscriptions: constants::DEFAULT_MAX_SUBSCRIPTIONS_PER_CONN,
            max_filters_per_sub: constants::DEFAULT_MAX_FILTERS_PER_SUB,
        }
    }
}

/// Drive one upgraded WebSocket until the client closes it, the connection
/// errors, or it sits idle past `config.idle_timeout`.
pub async fn handle_connection<S>(
    socket: WebSocket,
    write_gate: Arc<WriteGate<S>>,
    store: Arc<S>,
    broadcaster: Broadcaster,
    config: ConnectionConfig,
) where
    S: EventStore,
{
    let (mut sink, mut stream) = socket.split();
    let mut subs = ConnectionSubscriptions::new(config.max_subscriptions, config.max_filters_per_sub);
    let mut live = broadcaster.subscribe();
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        last_activity = Instant::now();
                        if text.len() > config.max_message_size {
                            warn!(size = text.len(), "gossip frame exceeds the connection's size limit");
                            continue;
                        }
                        if !dispatch_client_frame(&text, &write_gate, &store, &broadcaster, &mut subs, &mut sink).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        last_activity = Instant::now();
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_activity = Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Binary(_))) => {
                        warn!("ignoring unsupported binary gossip frame");
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "gossip connection error");
                        break;
                    }
                }
            }
            event = live.recv() => {
                match event {
                    Ok(msg) => {
                        for sub_id in subs.matching(&msg) {
                            let relay_msg = RelayMessage::Event { sub_id, event: msg.clone() };
                            if sink.send(Message::Text(relay_msg.to_json())).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber fell behind the relay's fan-out buffer, dropped oldest events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = tokio::time::sleep_until(last_activity + config.idle_timeout) => {
                debug!("closing idle gossip connection");
                break;
            }
        }
    }
}

/// Decode and act on one client frame. Returns `false` when the connection
/// should close (a send failed).
async fn dispatch_client_frame<S>(
    text: &str,
    write_gate: &WriteGate<S>,
    store: &S,
    broadcaster: &Broadcaster,
    subs: &mut ConnectionSubscriptions,
    sink: &mut SplitSink<WebSocket, Message>,
) -> bool
where
    S: EventStore,
{
    let client_msg = match ClientMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "dropping malformed gossip frame");
            return true;
        }
    };

    match client_msg {
        ClientMessage::Event(msg) => {
            let (accepted, reason) = match write_gate.process(&msg, PaymentContext::Unpaid) {
                Ok(WriteOutcome::Accepted(outcome)) => {
                    if should_broadcast(outcome) {
                        broadcaster.publish(msg.clone());
                    }
                    (true, String::new())
                }
                Ok(WriteOutcome::Rejected(reason)) => (false, reason),
                Err(e) => (false, e.to_string()),
            };
            let ack = RelayMessage::Ok { id: msg.id, accepted, message: reason };
            sink.send(Message::Text(ack.to_json())).await.is_ok()
        }
        ClientMessage::Req { sub_id, filters } => {
            match store.query_many(&filters) {
                Ok(stored) => {
                    for event in stored {
                        let relay_msg = RelayMessage::Event { sub_id: sub_id.clone(), event };
                        if sink.send(Message::Text(relay_msg.to_json())).await.is_err() {
                            return false;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to replay stored events for subscription");
                }
            }
            if let Err(e) = subs.open(sub_id.clone(), filters) {
                warn!(error = %e, sub_id, "rejecting subscription");
            }
            let eose = RelayMessage::Eose(sub_id);
            sink.send(Message::Text(eose.to_json())).await.is_ok()
        }
        ClientMessage::Close(sub_id) => {
            subs.close(&sub_id);
            true
        }
    }
}
