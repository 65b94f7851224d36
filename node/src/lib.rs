//! Token subsystem assembly for the ITC node.
//!
//! Wires the ledger, its persistence, the gossip adapter, and the
//! chain-event follower into one owned service the host node constructs
//! at startup.

pub mod config;
pub mod error;
pub mod follower;
pub mod logging;
pub mod service;

pub use config::TokenNodeConfig;
pub use error::NodeError;
pub use follower::{ChainEvent, ChainFollower};
pub use service::TokenService;
