//! Token operations: the unit of change, its wire codec, its fingerprint,
//! and the canonical message signed over it.

use itc_crypto::sha256d;
use itc_protocol::{ByteReader, ByteWriter, CodecError};
use itc_types::{Amount, Fingerprint};

/// The nine operation kinds, wire-tagged as a single byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TokenOp {
    #[default]
    Create = 0,
    Transfer = 1,
    Approve = 2,
    TransferFrom = 3,
    IncreaseAllowance = 4,
    DecreaseAllowance = 5,
    Burn = 6,
    Mint = 7,
    TransferOwnership = 8,
}

impl TokenOp {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a wire tag. Unknown tags are a decode error, not a default.
    pub fn from_u8(value: u8) -> Option<TokenOp> {
        match value {
            0 => Some(TokenOp::Create),
            1 => Some(TokenOp::Transfer),
            2 => Some(TokenOp::Approve),
            3 => Some(TokenOp::TransferFrom),
            4 => Some(TokenOp::IncreaseAllowance),
            5 => Some(TokenOp::DecreaseAllowance),
            6 => Some(TokenOp::Burn),
            7 => Some(TokenOp::Mint),
            8 => Some(TokenOp::TransferOwnership),
            _ => None,
        }
    }
}

/// A signed record describing one state transition over token balances,
/// allowances, supply, or metadata.
///
/// `wallet_name` is a local routing hint naming the fee-paying wallet. It
/// is never serialized, never hashed, and never signed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenOperation {
    pub op: TokenOp,
    pub from: String,
    pub to: String,
    pub spender: String,
    pub token: String,
    pub amount: Amount,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub timestamp: i64,
    pub signer: String,
    pub signature: String,
    pub wallet_name: String,
    pub memo: String,
}

impl TokenOperation {
    /// Append the canonical serialization to a writer.
    ///
    /// Field order is fixed: op tag, from, to, spender, token, amount,
    /// name, symbol, decimals, timestamp, signer, signature, then a memo
    /// flag byte followed by the memo when the flag is 1.
    pub fn encode_into(&self, w: &mut ByteWriter) {
        w.put_u8(self.op.as_u8());
        w.put_string(&self.from);
        w.put_string(&self.to);
        w.put_string(&self.spender);
        w.put_string(&self.token);
        w.put_i64(self.amount);
        w.put_string(&self.name);
        w.put_string(&self.symbol);
        w.put_u8(self.decimals);
        w.put_i64(self.timestamp);
        w.put_string(&self.signer);
        w.put_string(&self.signature);
        if self.memo.is_empty() {
            w.put_u8(0);
        } else {
            w.put_u8(1);
            w.put_string(&self.memo);
        }
    }

    /// Canonical serialization as an owned buffer.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(256);
        self.encode_into(&mut w);
        w.into_bytes()
    }

    /// Size of the canonical serialization — the base of the fee formula.
    pub fn serialized_size(&self) -> usize {
        self.to_wire_bytes().len()
    }

    fn decode_fields(r: &mut ByteReader<'_>) -> Result<TokenOperation, CodecError> {
        let tag = r.read_u8()?;
        let op = TokenOp::from_u8(tag).ok_or(CodecError::InvalidValue("op"))?;
        Ok(TokenOperation {
            op,
            from: r.read_string()?,
            to: r.read_string()?,
            spender: r.read_string()?,
            token: r.read_string()?,
            amount: r.read_i64()?,
            name: r.read_string()?,
            symbol: r.read_string()?,
            decimals: r.read_u8()?,
            timestamp: r.read_i64()?,
            signer: r.read_string()?,
            signature: r.read_string()?,
            wallet_name: String::new(),
            memo: String::new(),
        })
    }

    /// Decode from a reader positioned at an operation (current format).
    pub fn decode_from(r: &mut ByteReader<'_>) -> Result<TokenOperation, CodecError> {
        let mut op = Self::decode_fields(r)?;
        match r.read_u8()? {
            0 => {}
            1 => op.memo = r.read_string()?,
            _ => return Err(CodecError::InvalidValue("memo flag")),
        }
        Ok(op)
    }

    /// Decode a complete buffer in the current format.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<TokenOperation, CodecError> {
        let mut r = ByteReader::new(bytes);
        let op = Self::decode_from(&mut r)?;
        if !r.is_empty() {
            return Err(CodecError::TrailingBytes);
        }
        Ok(op)
    }

    /// Decode a complete buffer in the legacy format, which lacks the memo
    /// flag byte: the memo, if any, is whatever string remains after the
    /// signature.
    pub fn from_wire_bytes_legacy(bytes: &[u8]) -> Result<TokenOperation, CodecError> {
        let mut r = ByteReader::new(bytes);
        let mut op = Self::decode_fields(&mut r)?;
        if !r.is_empty() {
            op.memo = r.read_string()?;
        }
        if !r.is_empty() {
            return Err(CodecError::TrailingBytes);
        }
        Ok(op)
    }

    /// Decode an on-chain payload: current format first, then the legacy
    /// fallback.
    pub fn from_onchain_bytes(bytes: &[u8]) -> Result<TokenOperation, CodecError> {
        Self::from_wire_bytes(bytes).or_else(|_| Self::from_wire_bytes_legacy(bytes))
    }

    /// The 256-bit fingerprint: SHA-256d of the canonical serialization
    /// with signer and signature replaced by empty strings. The sole input
    /// to dedupe.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut stripped = self.clone();
        stripped.signer.clear();
        stripped.signature.clear();
        Fingerprint::new(sha256d(&stripped.to_wire_bytes()))
    }

    /// The canonical signing message — the exact string the signer signs
    /// and the verifier rebuilds. Stable across versions.
    pub fn signing_message(&self) -> String {
        let mut msg = format!(
            "op={}|from={}|to={}|spender={}|token={}|amount={}|name={}|symbol={}|decimals={}|timestamp={}",
            self.op.as_u8(),
            self.from,
            self.to,
            self.spender,
            self.token,
            self.amount,
            self.name,
            self.symbol,
            self.decimals,
            self.timestamp,
        );
        if !self.memo.is_empty() {
            msg.push_str("|memo=");
            msg.push_str(&self.memo);
        }
        msg
    }
}
