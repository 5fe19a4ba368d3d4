//! In-memory connector pair fixture.

use std::sync::Arc;

use starling_connector::{DirectConnector, DirectNetwork};

/// Two `DirectConnector`s sharing one `DirectNetwork`, routable to each other
/// by the given addresses. Neither has a packet handler registered yet —
/// callers wire one up with `register_packet_handler` before exercising the
/// path under test.
pub fn connector_pair(
    addr_a: &str,
    addr_b: &str,
) -> (Arc<DirectConnector>, Arc<DirectConnector>) {
    let network = DirectNetwork::new();
    let a = DirectConnector::new(Arc::clone(&network), addr_a);
    let b = DirectConnector::new(network, addr_b);
    (a, b)
}
