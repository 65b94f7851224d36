//! The ledger state model, its per-operation semantics, and the versioned
//! on-disk codec.
//!
//! All maps are `BTreeMap` so that encoding a given state always produces
//! the same bytes: flushing twice without mutation writes identical blobs.

use std::collections::BTreeMap;

use itc_protocol::{ByteReader, ByteWriter, CodecError};
use itc_types::address::WITNESS_PREFIX;
use itc_types::Amount;

use crate::operation::{TokenOp, TokenOperation};

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 3;

/// Per-token metadata, created atomically by Create.
///
/// `operator_wallet` is the only field ever mutated afterwards, by
/// TransferOwnership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMeta {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub operator_wallet: String,
    pub creation_height: i64,
}

/// Key of one allowance entry, ordered lexicographically by
/// (owner, spender, token).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AllowanceKey {
    pub owner: String,
    pub spender: String,
    pub token: String,
}

/// Cached signer addresses for a local wallet, one slot per address kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletSigners {
    pub legacy: String,
    pub witness: String,
}

/// The complete token ledger state, as persisted under key `'s'`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerState {
    pub balances: BTreeMap<(String, String), Amount>,
    pub allowances: BTreeMap<AllowanceKey, Amount>,
    pub total_supply: BTreeMap<String, Amount>,
    pub token_meta: BTreeMap<String, TokenMeta>,
    pub history: BTreeMap<String, Vec<TokenOperation>>,
    pub governance_fees: Amount,
    pub fee_per_vbyte: Amount,
    pub create_fee_per_vbyte: Amount,
    pub wallet_signers: BTreeMap<String, WalletSigners>,
    pub tip_height: i64,
    pub version: u32,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: BTreeMap::new(),
            token_meta: BTreeMap::new(),
            history: BTreeMap::new(),
            governance_fees: 0,
            fee_per_vbyte: itc_types::params::DEFAULT_FEE_PER_VBYTE,
            create_fee_per_vbyte: itc_types::params::CREATE_FEE_PER_VBYTE,
            wallet_signers: BTreeMap::new(),
            tip_height: 0,
            version: SCHEMA_VERSION,
        }
    }
}

impl LedgerState {
    // ── Per-operation semantics ─────────────────────────────────────────

    /// Dispatch one verified, deduped operation against the state.
    ///
    /// Preconditions are checked before any mutation, so a `false` return
    /// leaves the state untouched. `height` is recorded as the creation
    /// height of new tokens.
    pub fn apply_operation(&mut self, op: &TokenOperation, height: i64) -> bool {
        if op.amount < 0 {
            return false;
        }
        match op.op {
            TokenOp::Create => {
                self.create(&op.from, &op.token, op.amount, &op.name, &op.symbol, op.decimals, height);
                true
            }
            TokenOp::Transfer => self.transfer(&op.from, &op.to, &op.token, op.amount),
            TokenOp::Approve => {
                self.approve(&op.from, &op.to, &op.token, op.amount);
                true
            }
            TokenOp::TransferFrom => {
                self.transfer_from(&op.spender, &op.from, &op.to, &op.token, op.amount)
            }
            TokenOp::IncreaseAllowance => {
                self.increase_allowance(&op.from, &op.to, &op.token, op.amount);
                true
            }
            TokenOp::DecreaseAllowance => {
                self.decrease_allowance(&op.from, &op.to, &op.token, op.amount);
                true
            }
            TokenOp::Burn => self.burn(&op.from, &op.token, op.amount),
            TokenOp::Mint => self.mint(&op.from, &op.token, op.amount),
            TokenOp::TransferOwnership => self.transfer_ownership(&op.from, &op.to, &op.token),
        }
    }

    fn balance_of(&self, address: &str, token: &str) -> Amount {
        self.balances
            .get(&(address.to_string(), token.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, address: &str, token: &str, amount: Amount) {
        *self
            .balances
            .entry((address.to_string(), token.to_string()))
            .or_insert(0) += amount;
    }

    /// A second Create for a known token credits additional supply but
    /// leaves the existing metadata untouched.
    fn create(
        &mut self,
        creator: &str,
        token: &str,
        amount: Amount,
        name: &str,
        symbol: &str,
        decimals: u8,
        height: i64,
    ) {
        self.credit(creator, token, amount);
        *self.total_supply.entry(token.to_string()).or_insert(0) += amount;
        self.token_meta
            .entry(token.to_string())
            .or_insert_with(|| TokenMeta {
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
                operator_wallet: creator.to_string(),
                creation_height: height,
            });
    }

    fn transfer(&mut self, from: &str, to: &str, token: &str, amount: Amount) -> bool {
        if self.balance_of(from, token) < amount {
            return false;
        }
        self.credit(from, token, -amount);
        self.credit(to, token, amount);
        true
    }

    fn approve(&mut self, owner: &str, spender: &str, token: &str, amount: Amount) {
        let key = AllowanceKey {
            owner: owner.to_string(),
            spender: spender.to_string(),
            token: token.to_string(),
        };
        self.allowances.insert(key, amount);
    }

    fn increase_allowance(&mut self, owner: &str, spender: &str, token: &str, amount: Amount) {
        let key = AllowanceKey {
            owner: owner.to_string(),
            spender: spender.to_string(),
            token: token.to_string(),
        };
        *self.allowances.entry(key).or_insert(0) += amount;
    }

    /// Decrease erases the entry entirely when the result would be ≤ 0.
    fn decrease_allowance(&mut self, owner: &str, spender: &str, token: &str, amount: Amount) {
        let key = AllowanceKey {
            owner: owner.to_string(),
            spender: spender.to_string(),
            token: token.to_string(),
        };
        match self.allowances.get_mut(&key) {
            Some(value) if *value > amount => *value -= amount,
            _ => {
                self.allowances.remove(&key);
            }
        }
    }

    fn transfer_from(
        &mut self,
        spender: &str,
        from: &str,
        to: &str,
        token: &str,
        amount: Amount,
    ) -> bool {
        let key = AllowanceKey {
            owner: from.to_string(),
            spender: spender.to_string(),
            token: token.to_string(),
        };
        let allowed = self.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount || self.balance_of(from, token) < amount {
            return false;
        }
        self.credit(from, token, -amount);
        self.credit(to, token, amount);
        if let Some(value) = self.allowances.get_mut(&key) {
            *value -= amount;
        }
        true
    }

    fn burn(&mut self, holder: &str, token: &str, amount: Amount) -> bool {
        if !self.token_meta.contains_key(token) || self.balance_of(holder, token) < amount {
            return false;
        }
        self.credit(holder, token, -amount);
        *self.total_supply.entry(token.to_string()).or_insert(0) -= amount;
        true
    }

    fn mint(&mut self, minter: &str, token: &str, amount: Amount) -> bool {
        match self.token_meta.get(token) {
            Some(meta) if meta.operator_wallet == minter => {}
            _ => return false,
        }
        self.credit(minter, token, amount);
        *self.total_supply.entry(token.to_string()).or_insert(0) += amount;
        true
    }

    fn transfer_ownership(&mut self, from: &str, to: &str, token: &str) -> bool {
        match self.token_meta.get_mut(token) {
            Some(meta) if meta.operator_wallet == from => {
                meta.operator_wallet = to.to_string();
                true
            }
            _ => false,
        }
    }

    /// Check the supply invariant: for every token with metadata, total
    /// supply equals the sum of balances.
    pub fn supply_matches_balances(&self) -> bool {
        self.token_meta.keys().all(|token| {
            let sum: Amount = self
                .balances
                .iter()
                .filter(|((_, t), _)| t == token)
                .map(|(_, amount)| *amount)
                .sum();
            sum == self.total_supply.get(token).copied().unwrap_or(0)
        })
    }

    // ── On-disk codec ───────────────────────────────────────────────────

    /// Encode the state under the current schema.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(1024);

        w.put_var_int(self.balances.len() as u64);
        for ((address, token), amount) in &self.balances {
            w.put_string(address);
            w.put_string(token);
            w.put_i64(*amount);
        }

        w.put_var_int(self.allowances.len() as u64);
        for (key, amount) in &self.allowances {
            w.put_string(&key.owner);
            w.put_string(&key.spender);
            w.put_string(&key.token);
            w.put_i64(*amount);
        }

        w.put_var_int(self.total_supply.len() as u64);
        for (token, amount) in &self.total_supply {
            w.put_string(token);
            w.put_i64(*amount);
        }

        w.put_var_int(self.token_meta.len() as u64);
        for (token, meta) in &self.token_meta {
            w.put_string(token);
            w.put_string(&meta.name);
            w.put_string(&meta.symbol);
            w.put_u8(meta.decimals);
            w.put_string(&meta.operator_wallet);
            w.put_i64(meta.creation_height);
        }

        w.put_var_int(self.history.len() as u64);
        for (token, ops) in &self.history {
            w.put_string(token);
            w.put_var_int(ops.len() as u64);
            for op in ops {
                op.encode_into(&mut w);
            }
        }

        w.put_i64(self.governance_fees);
        w.put_i64(self.fee_per_vbyte);
        w.put_i64(self.create_fee_per_vbyte);

        w.put_var_int(self.wallet_signers.len() as u64);
        for (wallet, signers) in &self.wallet_signers {
            w.put_string(wallet);
            w.put_string(&signers.legacy);
            w.put_string(&signers.witness);
        }

        w.put_i64(self.tip_height);
        w.put_u32(self.version);

        w.into_bytes()
    }

    /// Decode a current-schema (V3) blob.
    pub fn decode(bytes: &[u8]) -> Result<LedgerState, CodecError> {
        let mut r = ByteReader::new(bytes);
        let mut state = Self::decode_common(&mut r)?;

        let signer_count = r.read_var_int()?;
        for _ in 0..signer_count {
            let wallet = r.read_string()?;
            let legacy = r.read_string()?;
            let witness = r.read_string()?;
            state
                .wallet_signers
                .insert(wallet, WalletSigners { legacy, witness });
        }

        state.tip_height = r.read_i64()?;
        state.version = r.read_u32()?;
        if !r.is_empty() {
            return Err(CodecError::TrailingBytes);
        }
        Ok(state)
    }

    /// Decode a legacy V2 blob, migrating the flat signer map into the
    /// two-slot form: values with the native-segwit prefix land in the
    /// witness slot, everything else in the legacy slot.
    pub fn decode_v2(bytes: &[u8]) -> Result<LedgerState, CodecError> {
        let mut r = ByteReader::new(bytes);
        let mut state = Self::decode_common(&mut r)?;

        let signer_count = r.read_var_int()?;
        for _ in 0..signer_count {
            let wallet = r.read_string()?;
            let address = r.read_string()?;
            let mut signers = WalletSigners::default();
            if address.starts_with(WITNESS_PREFIX) {
                signers.witness = address;
            } else {
                signers.legacy = address;
            }
            state.wallet_signers.insert(wallet, signers);
        }

        state.tip_height = r.read_i64()?;
        r.read_u32()?; // stored version, superseded by the migration
        state.version = SCHEMA_VERSION;
        if !r.is_empty() {
            return Err(CodecError::TrailingBytes);
        }
        Ok(state)
    }

    /// Decode the fields shared by every schema version, up to (and
    /// excluding) the wallet-signer map.
    fn decode_common(r: &mut ByteReader<'_>) -> Result<LedgerState, CodecError> {
        let mut state = LedgerState::default();

        let balance_count = r.read_var_int()?;
        for _ in 0..balance_count {
            let address = r.read_string()?;
            let token = r.read_string()?;
            let amount = r.read_i64()?;
            state.balances.insert((address, token), amount);
        }

        let allowance_count = r.read_var_int()?;
        for _ in 0..allowance_count {
            let key = AllowanceKey {
                owner: r.read_string()?,
                spender: r.read_string()?,
                token: r.read_string()?,
            };
            let amount = r.read_i64()?;
            state.allowances.insert(key, amount);
        }

        let supply_count = r.read_var_int()?;
        for _ in 0..supply_count {
            let token = r.read_string()?;
            let amount = r.read_i64()?;
            state.total_supply.insert(token, amount);
        }

        let meta_count = r.read_var_int()?;
        for _ in 0..meta_count {
            let token = r.read_string()?;
            let meta = TokenMeta {
                name: r.read_string()?,
                symbol: r.read_string()?,
                decimals: r.read_u8()?,
                operator_wallet: r.read_string()?,
                creation_height: r.read_i64()?,
            };
            state.token_meta.insert(token, meta);
        }

        let history_count = r.read_var_int()?;
        for _ in 0..history_count {
            let token = r.read_string()?;
            let op_count = r.read_var_int()?;
            let mut ops = Vec::with_capacity(op_count.min(1024) as usize);
            for _ in 0..op_count {
                ops.push(TokenOperation::decode_from(r)?);
            }
            state.history.insert(token, ops);
        }

        state.governance_fees = r.read_i64()?;
        state.fee_per_vbyte = r.read_i64()?;
        state.create_fee_per_vbyte = r.read_i64()?;

        Ok(state)
    }
}
