//! Merges the relay's gossip router, the `/health` endpoint, and (in remote
//! connector mode) the `POST /handle-packet` runtime API (§6) into one
//! axum app.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use starling_connector::Connector;
use starling_store::EventStore;

use crate::health::{health, peers, HealthState};
use crate::payment_handler::{handle_packet, PaymentHandlerContext};

#[derive(Deserialize)]
pub struct HandlePacketRequest {
    pub amount: u64,
    #[allow(dead_code)]
    pub destination: String,
    /// Base64-encoded packet payload, per §6.
    pub data: String,
}

#[derive(Serialize)]
pub struct HandlePacketResponse {
    pub accept: bool,
    pub code: Option<String>,
    pub message: Option<String>,
    pub data: Option<String>,
}

struct HandlePacketState<S: EventStore> {
    ctx: Arc<PaymentHandlerContext<S>>,
    connector: Arc<dyn Connector>,
}

async fn handle_packet_route<S>(
    State(state): State<Arc<HandlePacketState<S>>>,
    Json(request): Json<HandlePacketRequest>,
) -> Json<HandlePacketResponse>
where
    S: EventStore + 'static,
{
    use base64::Engine;

    let data = match base64::engine::general_purpose::STANDARD.decode(&request.data) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Json(HandlePacketResponse {
                accept: false,
                code: Some("F00".to_string()),
                message: Some(format!("invalid base64 payload: {e}")),
                data: None,
            })
        }
    };

    let packet = starling_connector::IncomingPacket {
        source_routing_address: request.destination.clone(),
        amount: request.amount,
        data,
    };

    match handle_packet(&state.ctx, state.connector.as_ref(), packet).await {
        starling_connector::PacketOutcome::Fulfill { data } => Json(HandlePacketResponse {
            accept: true,
            code: None,
            message: None,
            data: Some(base64::engine::general_purpose::STANDARD.encode(data)),
        }),
        starling_connector::PacketOutcome::Reject { code, message } => Json(HandlePacketResponse {
            accept: false,
            code: Some(code),
            message: Some(message),
            data: None,
        }),
    }
}

/// The full node router: the relay's gossip upgrade route, `/health`, and
/// `/handle-packet` for out-of-process connector deployments.
pub fn router<S>(
    relay_state: Arc<starling_relay::RelayState<S>>,
    health_state: Arc<HealthState>,
    payment_ctx: Arc<PaymentHandlerContext<S>>,
    connector: Arc<dyn Connector>,
) -> Router
where
    S: EventStore + 'static,
{
    let handle_packet_state = Arc::new(HandlePacketState { ctx: payment_ctx, connector });

    let gossip = starling_relay::router(relay_state);
    let health_router = Router::new()
        .route("/health", axum::routing::get(health))
        .route("/peers", axum::routing::get(peers))
        .with_state(health_state);
    let handle_packet_router =
        Router::new().route("/handle-packet", post(handle_packet_route::<S>)).with_state(handle_packet_state);

    Router::new().nest("/gossip", gossip).merge(health_router).merge(handle_packet_router)
}
