//! Tunable parameters of the token subsystem.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// Default fee rate for token operations (excluding create).
pub const DEFAULT_FEE_PER_VBYTE: Amount = 10_000;

/// Special fee rate applied when creating new tokens.
pub const CREATE_FEE_PER_VBYTE: Amount = 10_000_000;

/// Minimum governance fee per operation (0.075 ITC).
pub const MIN_GOV_FEE: Amount = 7_500_000;

/// Value of the dust-marker output carrying an on-chain operation record.
pub const DUST_MARKER: Amount = 546;

/// Runtime parameters of the token subsystem.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenParams {
    /// Fee rate (base units per virtual byte) for non-create operations.
    pub fee_per_vbyte: Amount,

    /// Fee rate for Create operations.
    pub create_fee_per_vbyte: Amount,

    /// Floor applied to every computed governance fee.
    pub min_gov_fee: Amount,

    /// Lowest block height considered during rescan.
    pub activation_height: i64,

    /// Destination address for governance fee outputs.
    pub governance_wallet: String,
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            fee_per_vbyte: DEFAULT_FEE_PER_VBYTE,
            create_fee_per_vbyte: CREATE_FEE_PER_VBYTE,
            min_gov_fee: MIN_GOV_FEE,
            activation_height: 0,
            governance_wallet: "itc1qwccnjw6gz49vlsjvf3f6wvamltmqdykwmh0r4r".to_string(),
        }
    }
}
