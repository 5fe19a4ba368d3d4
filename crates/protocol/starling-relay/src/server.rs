//! The relay's axum entry point: one WebSocket upgrade route speaking the
//! gossip wire protocol (§4.4, §6).

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use starling_pricing::PricingEngine;
use starling_store::EventStore;

use crate::connection::{handle_connection, ConnectionConfig};
use crate::subscription::Broadcaster;
use crate::write_gate::WriteGate;

pub struct RelayState<S: EventStore> {
    pub store: Arc<S>,
    pub write_gate: Arc<WriteGate<S>>,
    pub broadcaster: Broadcaster,
    pub connection_config: ConnectionConfig,
}

impl<S: EventStore> RelayState<S> {
    pub fn new(store: Arc<S>, pricing: Arc<PricingEngine>) -> Self {
        Self {
            write_gate: Arc::new(WriteGate::new(store.clone(), pricing)),
            store,
            broadcaster: Broadcaster::default(),
            connection_config: ConnectionConfig::default(),
        }
    }

    pub fn with_connection_config(mut self, config: ConnectionConfig) -> Self {
        self.connection_config = config;
        self
    }
}

/// Build the relay's router. Mounted at whatever path the node wires it to
/// (e.g. `/gossip`) alongside the connector admin API and `/health`.
pub fn router<S>(state: Arc<RelayState<S>>) -> Router
where
    S: EventStore + 'static,
{
    Router::new().route("/", get(upgrade)).with_state(state)
}

async fn upgrade<S>(ws: WebSocketUpgrade, State(state): State<Arc<RelayState<S>>>) -> Response
where
    S: EventStore + 'static,
{
    ws.on_upgrade(move |socket| async move {
        handle_connection(
            socket,
            state.write_gate.clone(),
            state.store.clone(),
            state.broadcaster.clone(),
            state.connection_config.clone(),
        )
        .await;
    })
}
