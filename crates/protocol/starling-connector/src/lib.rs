//! Packet routing and payment-channel client (C7, §4.7).
//!
//! [`Connector`] is the abstract contract; [`DirectConnector`] satisfies it
//! in-process for bootstrap/test setups, [`RemoteConnector`] satisfies it
//! over HTTP against an out-of-process connector.

mod direct;
mod error;
mod remote;
mod retry;
mod traits;
mod types;

pub use direct::{DirectConnector, DirectNetwork};
pub use error::{ConnectorError, Result};
pub use remote::RemoteConnector;
pub use retry::RetryPolicy;
pub use traits::Connector;
pub use types::{Chain, ChannelInfo, ChannelState, IncomingPacket, PacketHandler, PacketOutcome, PeerRoute};
