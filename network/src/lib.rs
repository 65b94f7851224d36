//! `TOKENTX` gossip for the ITC token subsystem.
//!
//! Outbound: the [`TokenBroadcaster`] floods serialized operations to
//! every connected peer via the connection layer's outbound queue.
//! Inbound: the [`GossipHandler`] decodes payloads, feeds them to the
//! ledger with `broadcast = false`, and penalizes peers that deliver
//! invalid operations.

pub mod error;
pub mod gossip;
pub mod peers;

pub use error::NetworkError;
pub use gossip::{GossipHandler, OutboundMessage, TokenBroadcaster, TOKENTX};
pub use peers::{PeerRegistry, MISBEHAVIOR_INVALID_TOKEN_OP};
