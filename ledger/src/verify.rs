//! The signature gate every operation passes before touching state.

use itc_types::AddressKind;
use tracing::debug;

use crate::operation::{TokenOp, TokenOperation};

/// Verify an operation's signature and role binding.
///
/// 1. `signer` must be a keyed address kind.
/// 2. The signature must verify over the canonical signing message.
/// 3. `TransferFrom` must be signed by the spender; every other kind by
///    `from`. (Mint's operator check happens inside apply/replay, where
///    token metadata is available.)
///
/// Callers must not mutate state when this returns `false`.
pub fn verify_operation(op: &TokenOperation) -> bool {
    if AddressKind::of(&op.signer).is_none() {
        debug!(signer = %op.signer, "rejecting operation: signer is not a keyed address");
        return false;
    }

    let message = op.signing_message();
    if let Err(err) = itc_crypto::verify_message(&op.signer, &op.signature, &message) {
        debug!(signer = %op.signer, %err, "rejecting operation: signature verification failed");
        return false;
    }

    let expected = match op.op {
        TokenOp::TransferFrom => &op.spender,
        _ => &op.from,
    };
    if op.signer != *expected {
        debug!(
            signer = %op.signer,
            expected = %expected,
            "rejecting operation: signer does not match the required role"
        );
        return false;
    }

    true
}
