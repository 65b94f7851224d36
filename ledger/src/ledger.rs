//! The token ledger service: apply/replay pipelines, block processing,
//! rescan, persistence, and the query surface.
//!
//! One `TokenLedger` is constructed at node startup and shared by the RPC
//! layer, the gossip handler, and the chain follower. All state lives
//! behind a single mutex; public methods are thin locking shells over
//! inner functions, and collaborator locks (wallet, peer registry) are
//! only ever taken while the ledger lock is held — never the reverse.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use itc_store::{KvStore, StoreError};
use itc_types::address::{LEGACY_PREFIX, WITNESS_PREFIX};
use itc_types::params::DUST_MARKER;
use itc_types::{Amount, Block, Fingerprint, TokenParams};

use crate::error::LedgerError;
use crate::operation::{TokenOp, TokenOperation};
use crate::script::{op_return_script, parse_op_return};
use crate::state::{AllowanceKey, LedgerState, TokenMeta, WalletSigners, SCHEMA_VERSION};
use crate::traits::{ChainView, KeyStore, Recipient, TokenGossip, WalletService};
use crate::verify::verify_operation;

/// Store key of the serialized ledger state.
const KEY_STATE: &[u8] = b"s";
/// Store key of the schema version.
const KEY_VERSION: &[u8] = b"v";

/// Dummy message used when probing wallet addresses for signing ability.
const SIGNER_PROBE: &str = "signer_check";

struct LedgerInner {
    state: LedgerState,
    /// Fingerprints of every operation ingested this run. Intentionally
    /// not persisted: rescan clears it and block replay refills it.
    seen_ops: HashSet<Fingerprint>,
}

/// The token ledger service.
pub struct TokenLedger {
    inner: Mutex<LedgerInner>,
    params: TokenParams,
    store: Arc<dyn KvStore>,
    chain: Arc<dyn ChainView>,
    wallet: Arc<dyn WalletService>,
    gossip: Arc<dyn TokenGossip>,
}

impl TokenLedger {
    pub fn new(
        params: TokenParams,
        store: Arc<dyn KvStore>,
        chain: Arc<dyn ChainView>,
        wallet: Arc<dyn WalletService>,
        gossip: Arc<dyn TokenGossip>,
    ) -> Self {
        let state = LedgerState {
            fee_per_vbyte: params.fee_per_vbyte,
            create_fee_per_vbyte: params.create_fee_per_vbyte,
            ..LedgerState::default()
        };
        Self {
            inner: Mutex::new(LedgerInner {
                state,
                seen_ops: HashSet::new(),
            }),
            params,
            store,
            chain,
            wallet,
            gossip,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().expect("token ledger mutex poisoned")
    }

    pub fn params(&self) -> &TokenParams {
        &self.params
    }

    // ── Load / flush ────────────────────────────────────────────────────

    /// Load persisted state, migrating older schemas.
    ///
    /// An empty store starts fresh. V2 blobs are migrated to V3 and
    /// rewritten immediately; versions newer than [`SCHEMA_VERSION`] are
    /// refused.
    pub fn load(&self) -> Result<(), LedgerError> {
        let mut inner = self.lock();

        let Some(version_bytes) = self.store.read(KEY_VERSION)? else {
            inner.state.tip_height = self.params.activation_height - 1;
            info!("token db is empty, starting fresh");
            return Ok(());
        };
        let version_arr: [u8; 4] = version_bytes.as_slice().try_into().map_err(|_| {
            StoreError::Corruption("schema version has unexpected byte length".to_string())
        })?;
        let version = u32::from_le_bytes(version_arr);

        let blob = self.store.read(KEY_STATE)?.ok_or_else(|| {
            StoreError::Corruption("schema version present but state blob missing".to_string())
        })?;

        let state = match version {
            SCHEMA_VERSION => LedgerState::decode(&blob)?,
            2 => LedgerState::decode_v2(&blob)?,
            other => return Err(LedgerError::UnsupportedSchema(other)),
        };

        inner.state = state;
        inner.seen_ops.clear();
        if inner.state.tip_height == 0 {
            inner.state.tip_height = self.params.activation_height - 1;
        }

        if version < SCHEMA_VERSION {
            self.flush_locked(&inner.state)?;
            info!(from = version, to = SCHEMA_VERSION, "migrated token db schema");
        }

        info!(
            tokens = inner.state.token_meta.len(),
            tip = inner.state.tip_height,
            "token ledger loaded"
        );
        Ok(())
    }

    /// Persist the current state.
    pub fn flush(&self) -> Result<(), LedgerError> {
        let inner = self.lock();
        self.flush_locked(&inner.state)
    }

    fn flush_locked(&self, state: &LedgerState) -> Result<(), LedgerError> {
        let blob = state.encode();
        let version_bytes = SCHEMA_VERSION.to_le_bytes();
        self.store
            .write_batch(&[(KEY_STATE, blob.as_slice()), (KEY_VERSION, &version_bytes)], true)?;
        Ok(())
    }

    // ── Apply / replay ──────────────────────────────────────────────────

    /// Ingress for locally-originated and peer-delivered operations.
    ///
    /// Verifies, dedupes, and mutates; on success settles the governance
    /// fee, persists, records the operation on-chain, and gossips it —
    /// the last three only on the broadcast path, and fee settlement and
    /// on-chain recording only when a fee-paying wallet is named.
    ///
    /// `Ok(false)` is a rejection (invalid signature, duplicate, or
    /// precondition failure); `Err` is a fatal persistence failure.
    pub fn apply(
        &self,
        op: &TokenOperation,
        wallet_name: &str,
        broadcast: bool,
    ) -> Result<bool, LedgerError> {
        let mut inner = self.lock();
        let height = self.chain.current_height();

        if !ingest(&mut inner, op, height) {
            return Ok(false);
        }

        let rate = if op.op == TokenOp::Create {
            inner.state.create_fee_per_vbyte
        } else {
            inner.state.fee_per_vbyte
        };
        let fee = (op.serialized_size() as Amount * rate).max(self.params.min_gov_fee);

        if broadcast && !wallet_name.is_empty() {
            // Fee settlement failure is non-fatal: the op still commits,
            // but no fee is recorded.
            match self
                .wallet
                .send_governance_fee(wallet_name, fee, &self.params.governance_wallet)
            {
                Ok(()) => inner.state.governance_fees += fee,
                Err(err) => warn!(wallet = wallet_name, fee, %err, "governance fee not settled"),
            }
        }

        self.flush_locked(&inner.state)?;

        if broadcast && !wallet_name.is_empty() {
            let recipient = Recipient {
                script_pubkey: op_return_script(&op.to_wire_bytes()),
                value: DUST_MARKER,
            };
            if let Err(err) = self
                .wallet
                .create_and_commit_transaction(wallet_name, recipient)
            {
                warn!(wallet = wallet_name, %err, "failed to record operation on-chain");
            }
        }

        if broadcast {
            self.gossip.broadcast_operation(&op.to_wire_bytes());
        }

        debug!(
            op = op.op.as_u8(),
            token = %op.token,
            from = %op.from,
            to = %op.to,
            amount = op.amount,
            "token operation applied"
        );
        Ok(true)
    }

    /// Ingress for operations discovered inside connected blocks.
    ///
    /// Verify, dedupe, mutate — no fee settlement, no on-chain record, no
    /// gossip. This is what keeps a locally-originated operation from
    /// paying its fee twice when it arrives back inside a block.
    pub fn replay(&self, op: &TokenOperation, height: i64) -> Result<bool, LedgerError> {
        let mut inner = self.lock();
        Ok(ingest(&mut inner, op, height))
    }

    // ── Block follower ──────────────────────────────────────────────────

    /// Scan a connected block for embedded operations and replay them,
    /// then advance the tip and persist.
    pub fn process_block(&self, block: &Block, height: i64) -> Result<(), LedgerError> {
        let mut inner = self.lock();
        for output in block.outputs() {
            let Some(payload) = parse_op_return(&output.script_pubkey) else {
                continue;
            };
            match TokenOperation::from_onchain_bytes(payload) {
                Ok(op) => {
                    if ingest(&mut inner, &op, height) {
                        debug!(height, token = %op.token, "replayed token operation from block");
                    }
                }
                Err(err) => debug!(height, %err, "skipping undecodable OP_RETURN payload"),
            }
        }
        inner.state.tip_height = height;
        self.flush_locked(&inner.state)
    }

    /// Reset all state and replay forward from the activation height.
    ///
    /// Triggered on block disconnect. Because the whole state is cleared,
    /// replay must cover every block from activation regardless of how
    /// shallow the reorg was; the disconnect height is reported but does
    /// not bound the scan. Heights below activation can never hold
    /// operations.
    pub fn rescan_from_height(&self, from_height: i64) -> Result<(), LedgerError> {
        let start = self.params.activation_height;
        let tip = self.chain.current_height();
        info!(from_height, start, tip, "rescanning token operations");

        let mut inner = self.lock();
        inner.state.balances.clear();
        inner.state.allowances.clear();
        inner.state.total_supply.clear();
        inner.state.token_meta.clear();
        inner.state.history.clear();
        inner.state.governance_fees = 0;
        inner.seen_ops.clear();

        for height in start..=tip {
            let Some(block) = self.chain.read_block(height) else {
                continue;
            };
            for output in block.outputs() {
                let Some(payload) = parse_op_return(&output.script_pubkey) else {
                    continue;
                };
                if let Ok(op) = TokenOperation::from_onchain_bytes(payload) {
                    ingest(&mut inner, &op, height);
                }
            }
        }

        inner.state.tip_height = tip;
        self.flush_locked(&inner.state)
    }

    // ── Signing ─────────────────────────────────────────────────────────

    /// Resolve the signer address for a wallet, preferring the cached
    /// entry and otherwise probing the keystore's addresses for one of
    /// the requested kind that can actually sign. Probe hits are cached
    /// and persisted.
    pub fn signer_address(
        &self,
        keystore: &dyn KeyStore,
        wallet_name: &str,
        witness: bool,
    ) -> Result<Option<String>, LedgerError> {
        {
            let inner = self.lock();
            if let Some(cached) = inner.state.wallet_signers.get(wallet_name) {
                let slot = if witness { &cached.witness } else { &cached.legacy };
                if !slot.is_empty() {
                    return Ok(Some(slot.clone()));
                }
            }
        }

        for address in keystore.wallet_addresses(wallet_name) {
            let kind_matches = if witness {
                address.starts_with(WITNESS_PREFIX)
            } else {
                address.starts_with(LEGACY_PREFIX)
            };
            if !kind_matches {
                continue;
            }
            if keystore
                .sign_message(wallet_name, &address, SIGNER_PROBE)
                .is_err()
            {
                continue;
            }

            let mut inner = self.lock();
            let entry = inner
                .state
                .wallet_signers
                .entry(wallet_name.to_string())
                .or_insert_with(WalletSigners::default);
            if witness {
                entry.witness = address.clone();
            } else {
                entry.legacy = address.clone();
            }
            self.flush_locked(&inner.state)?;
            info!(wallet = wallet_name, signer = %address, "cached signer address");
            return Ok(Some(address));
        }

        warn!(wallet = wallet_name, witness, "no signer address found");
        Ok(None)
    }

    /// Stamp and sign an operation with the wallet's signer key.
    ///
    /// Sets `signer`, `wallet_name`, and `timestamp`, then signs the
    /// canonical message. Returns `Ok(false)` when the wallet has no
    /// usable signer.
    pub fn sign_operation(
        &self,
        op: &mut TokenOperation,
        keystore: &dyn KeyStore,
        wallet_name: &str,
        witness: bool,
    ) -> Result<bool, LedgerError> {
        let Some(signer) = self.signer_address(keystore, wallet_name, witness)? else {
            return Ok(false);
        };

        op.signer = signer;
        op.wallet_name = wallet_name.to_string();
        op.timestamp = unix_time();

        let message = op.signing_message();
        match keystore.sign_message(wallet_name, &op.signer, &message) {
            Ok(signature) => {
                op.signature = signature;
                Ok(true)
            }
            Err(err) => {
                warn!(wallet = wallet_name, signer = %op.signer, %err, "failed to sign operation");
                Ok(false)
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn balance(&self, address: &str, token: &str) -> Amount {
        let inner = self.lock();
        inner
            .state
            .balances
            .get(&(address.to_string(), token.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn allowance(&self, owner: &str, spender: &str, token: &str) -> Amount {
        let inner = self.lock();
        let key = AllowanceKey {
            owner: owner.to_string(),
            spender: spender.to_string(),
            token: token.to_string(),
        };
        inner.state.allowances.get(&key).copied().unwrap_or(0)
    }

    pub fn total_supply(&self, token: &str) -> Amount {
        let inner = self.lock();
        inner.state.total_supply.get(token).copied().unwrap_or(0)
    }

    pub fn token_meta(&self, token: &str) -> Option<TokenMeta> {
        let inner = self.lock();
        inner.state.token_meta.get(token).cloned()
    }

    pub fn token_exists(&self, token: &str) -> bool {
        let inner = self.lock();
        inner.state.token_meta.contains_key(token)
    }

    pub fn decimals(&self, token: &str) -> Option<u8> {
        let inner = self.lock();
        inner.state.token_meta.get(token).map(|meta| meta.decimals)
    }

    /// All known tokens as `(id, name, symbol)` triples.
    pub fn list_all_tokens(&self) -> Vec<(String, String, String)> {
        let inner = self.lock();
        inner
            .state
            .token_meta
            .iter()
            .map(|(token, meta)| (token.clone(), meta.name.clone(), meta.symbol.clone()))
            .collect()
    }

    /// Tokens the address holds a positive balance of.
    pub fn list_wallet_tokens(&self, address: &str) -> Vec<(String, String, String)> {
        let inner = self.lock();
        inner
            .state
            .balances
            .iter()
            .filter(|((holder, _), amount)| holder == address && **amount > 0)
            .map(|((_, token), _)| {
                let (name, symbol) = inner
                    .state
                    .token_meta
                    .get(token)
                    .map(|meta| (meta.name.clone(), meta.symbol.clone()))
                    .unwrap_or_default();
                (token.clone(), name, symbol)
            })
            .collect()
    }

    /// A token's operation history, optionally filtered to entries that
    /// touch `address_filter` as sender, recipient, or spender.
    pub fn history(&self, token: &str, address_filter: &str) -> Vec<TokenOperation> {
        let inner = self.lock();
        let Some(ops) = inner.state.history.get(token) else {
            return Vec::new();
        };
        ops.iter()
            .filter(|op| {
                address_filter.is_empty()
                    || op.from == address_filter
                    || op.to == address_filter
                    || op.spender == address_filter
            })
            .cloned()
            .collect()
    }

    /// Memo of the history entry with the given fingerprint, if any.
    pub fn memo_for(&self, token: &str, fingerprint: &Fingerprint) -> Option<String> {
        let inner = self.lock();
        inner
            .state
            .history
            .get(token)?
            .iter()
            .find(|op| op.fingerprint() == *fingerprint)
            .map(|op| op.memo.clone())
    }

    pub fn governance_balance(&self) -> Amount {
        let inner = self.lock();
        inner.state.governance_fees
    }

    pub fn fee_rate(&self) -> Amount {
        let inner = self.lock();
        inner.state.fee_per_vbyte
    }

    pub fn set_fee_rate(&self, fee_per_vbyte: Amount) {
        let mut inner = self.lock();
        inner.state.fee_per_vbyte = fee_per_vbyte;
    }

    pub fn tip_height(&self) -> i64 {
        let inner = self.lock();
        inner.state.tip_height
    }

    /// Snapshot of the full state (for tests and diagnostics).
    pub fn state_snapshot(&self) -> LedgerState {
        let inner = self.lock();
        inner.state.clone()
    }
}

/// Shared ingress path: verify, dedupe by fingerprint, mutate, append to
/// history. Both apply and replay funnel through here so their semantics
/// cannot drift apart.
fn ingest(inner: &mut LedgerInner, op: &TokenOperation, height: i64) -> bool {
    if !verify_operation(op) {
        return false;
    }
    let fingerprint = op.fingerprint();
    if !inner.seen_ops.insert(fingerprint) {
        debug!(%fingerprint, "token operation already seen");
        return false;
    }
    if !inner.state.apply_operation(op, height) {
        debug!(
            op = op.op.as_u8(),
            token = %op.token,
            "token operation failed preconditions"
        );
        return false;
    }
    inner
        .state
        .history
        .entry(op.token.clone())
        .or_default()
        .push(op.clone());
    true
}

fn unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs() as i64
}
