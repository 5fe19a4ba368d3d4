//! The Starling node: wires the signed-message codec (C1), event store
//! (C2), pricing engine (C3), paid relay (C4), encrypted handshake (C5),
//! trust engine (C6), connector client (C7), bootstrap orchestrator (C8),
//! payment handler (C9), and handler dispatch (C10) into one process.

pub mod bootstrap;
pub mod config;
pub mod dispatch;
mod error;
pub mod health;
pub mod identity;
pub mod payment_handler;
pub mod peer_table;
pub mod server;

pub use config::{default_data_dir, NodeConfig};
pub use error::{NodeError, Result};

use std::collections::BTreeMap;
use std::sync::Arc;

use starling_connector::{Connector, DirectConnector, DirectNetwork, RemoteConnector};
use starling_handshake::{HandshakeRateLimiter, ResponderIdentity};
use starling_pricing::{KindPricing, PricingEngine, PricingPolicy};
use starling_relay::RelayState;
use starling_store::SqliteEventStore;

use crate::bootstrap::BootstrapState;
use crate::config::ConnectorMode;
use crate::health::HealthState;
use crate::identity::NodeIdentity;
use crate::payment_handler::PaymentHandlerContext;
use crate::peer_table::PeerTable;

fn build_connector(config: &NodeConfig) -> Result<Arc<dyn Connector>> {
    match config.connector_mode {
        ConnectorMode::Direct => {
            let connector: Arc<dyn Connector> = DirectConnector::new(DirectNetwork::new(), config.routing_address.clone());
            Ok(connector)
        }
        ConnectorMode::Remote => {
            let url = config
                .connector_url
                .clone()
                .ok_or_else(|| NodeError::Config("connector_mode=remote requires --connector-url".to_string()))?;
            let connector: Arc<dyn Connector> = Arc::new(RemoteConnector::new(url));
            Ok(connector)
        }
    }
}

fn build_pricing(config: &NodeConfig, owner: starling_crypto::PeerId) -> PricingEngine {
    let mut policy = PricingPolicy::new(owner, config.asset_scale);
    policy.bootstrap_zero_price = config.bootstrap_zero_price;
    policy.default_pricing =
        KindPricing { flat: config.default_flat_fee, base_price_per_byte: config.default_price_per_byte };
    PricingEngine::new(policy)
}

/// Start the node and serve until the process is killed. The CLI's `start`
/// subcommand and the `starling-node` binary both call this so the two
/// never drift on how a node is actually wired up.
pub async fn run(config: NodeConfig) -> Result<()> {
    std::fs::create_dir_all(config.effective_data_dir()).map_err(|e| NodeError::Config(e.to_string()))?;

    let identity = Arc::new(NodeIdentity::load_or_generate(&config.identity_path())?);
    tracing::info!(peer = %starling_crypto::peer_id_to_string(&identity.peer), "node identity loaded");

    let store = Arc::new(SqliteEventStore::open(config.store_path())?);
    let pricing = Arc::new(build_pricing(&config, identity.peer));
    let write_gate = Arc::new(starling_relay::WriteGate::new(store.clone(), pricing.clone()));
    let broadcaster = starling_relay::Broadcaster::default();
    let peers = Arc::new(PeerTable::new());
    let bootstrap_state = Arc::new(BootstrapState::default());
    let trust_engine = Arc::new(starling_trust::TrustEngine::new(starling_trust::TrustWeights::default()));
    let connector = build_connector(&config)?;

    let responder = ResponderIdentity {
        peer: identity.peer,
        signing_key: identity.signing_key.clone(),
        seal_key: identity.seal_key.clone(),
        routing_address: config.routing_address.clone(),
        supported_chains: config.supported_chains.clone(),
        settlement_addresses: BTreeMap::new(),
        preferred_tokens: BTreeMap::new(),
    };

    let payment_ctx = Arc::new(PaymentHandlerContext {
        store: store.clone(),
        pricing: pricing.clone(),
        write_gate: write_gate.clone(),
        broadcaster: broadcaster.clone(),
        peers: peers.clone(),
        rate_limiter: Arc::new(HandshakeRateLimiter::default()),
        identity: identity.clone(),
        responder,
        peer_gating_enabled: config.peer_gating_enabled,
    });

    register_packet_handler(&connector, payment_ctx.clone());

    tracing::info!("starting bootstrap");
    bootstrap::run(
        &config,
        identity.clone(),
        connector.clone(),
        peers.clone(),
        bootstrap_state.clone(),
        store.clone(),
        broadcaster.clone(),
        trust_engine.clone(),
    )
    .await;
    tracing::info!("bootstrap phases complete, reverse discovery and trust refresh running in the background");

    let mut relay_state = RelayState::new(store.clone(), pricing.clone()).with_connection_config(Default::default());
    relay_state.broadcaster = broadcaster;
    let relay_state = Arc::new(relay_state);
    let health_state = Arc::new(HealthState { bootstrap: bootstrap_state, peers: peers.clone() });
    let app = server::router(relay_state, health_state, payment_ctx, connector);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| NodeError::Server(format!("failed to bind {}: {e}", config.bind_addr)))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app).await.map_err(|e| NodeError::Server(e.to_string()))
}

/// `DirectConnector`'s `PacketHandler` is a synchronous closure, but
/// `payment_handler::handle_packet` is async (it may await a channel open
/// inside the handshake). Bridge the two with `block_in_place` +
/// `Handle::current().block_on`, which requires the multi-threaded runtime
/// flavor `main.rs` selects. `RemoteConnector` deployments don't need this
/// bridge: there, the out-of-process connector calls back over HTTP via
/// `POST /handle-packet` (§6), which `server::router` already serves as a
/// plain async handler.
fn register_packet_handler<S>(connector: &Arc<dyn Connector>, ctx: Arc<PaymentHandlerContext<S>>)
where
    S: starling_store::EventStore + 'static,
{
    let connector_for_handler = Arc::clone(connector);
    connector.register_packet_handler(Arc::new(move |packet| {
        let ctx = ctx.clone();
        let connector = connector_for_handler.clone();
        tokio::task::block_in_place(move || {
            tokio::runtime::Handle::current()
                .block_on(async move { payment_handler::handle_packet(&ctx, connector.as_ref(), packet).await })
        })
    }));
}
