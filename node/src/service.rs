//! Assembly of the token subsystem into one owned service.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};

use itc_network::{GossipHandler, OutboundMessage, PeerRegistry, TokenBroadcaster, TOKENTX};
use itc_store::KvStore;
use itc_token_ledger::{ChainView, KeyStore, TokenLedger, TokenOperation, WalletService};
use itc_types::TokenParams;

use crate::NodeError;

/// The assembled token subsystem.
///
/// Constructed once at node startup and handed to the RPC layer, the
/// connection layer, and the validation-interface bridge. Field order
/// matters: the gossip handler is declared (and therefore dropped) before
/// the ledger, so inbound message handling always stops first on
/// teardown.
pub struct TokenService {
    handler: GossipHandler,
    ledger: Arc<TokenLedger>,
    peers: Arc<Mutex<PeerRegistry>>,
}

impl TokenService {
    /// Build the subsystem: broadcaster, ledger, gossip handler — then
    /// load persisted state.
    ///
    /// `outbound_tx` is the connection layer's outbound message queue.
    pub fn start(
        params: TokenParams,
        store: Arc<dyn KvStore>,
        chain: Arc<dyn ChainView>,
        wallet: Arc<dyn WalletService>,
        outbound_tx: mpsc::Sender<OutboundMessage>,
    ) -> Result<Self, NodeError> {
        let peers = Arc::new(Mutex::new(PeerRegistry::new()));
        let broadcaster = Arc::new(TokenBroadcaster::new(Arc::clone(&peers), outbound_tx));
        let ledger = Arc::new(TokenLedger::new(params, store, chain, wallet, broadcaster));
        ledger.load()?;

        let handler = GossipHandler::new(Arc::clone(&ledger), Arc::clone(&peers));
        info!("token service started");
        Ok(Self {
            handler,
            ledger,
            peers,
        })
    }

    pub fn ledger(&self) -> &Arc<TokenLedger> {
        &self.ledger
    }

    pub fn peers(&self) -> &Arc<Mutex<PeerRegistry>> {
        &self.peers
    }

    /// Sign and apply a locally-originated operation on the broadcast
    /// path: fee settlement, persistence, on-chain record, and gossip.
    pub fn submit_operation(
        &self,
        op: &mut TokenOperation,
        keystore: &dyn KeyStore,
        wallet_name: &str,
        witness: bool,
    ) -> Result<bool, NodeError> {
        if !self
            .ledger
            .sign_operation(op, keystore, wallet_name, witness)?
        {
            return Ok(false);
        }
        Ok(self.ledger.apply(op, wallet_name, true)?)
    }

    /// Route one inbound P2P message to the token subsystem. Non-token
    /// message kinds are ignored.
    pub fn handle_inbound(
        &self,
        peer_id: &str,
        kind: &str,
        payload: &[u8],
    ) -> Result<(), NodeError> {
        if kind != TOKENTX {
            debug!(peer = peer_id, kind, "ignoring non-token message");
            return Ok(());
        }
        self.handler.handle_tokentx(peer_id, payload)?;
        Ok(())
    }

    /// Tear the subsystem down. Field order guarantees the gossip
    /// handler drops before the ledger reference, so no inbound
    /// `TOKENTX` can race teardown.
    pub fn shutdown(self) {
        info!("token service stopped");
    }
}
