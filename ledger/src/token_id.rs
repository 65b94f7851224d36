//! Token identifier format and generation.
//!
//! A token id is an ASCII string of exactly 59 characters:
//! `"0x"` + 54 lowercase hex characters + `"tok"`.

use itc_crypto::sha256d_multi;

/// Total length of a well-formed token id.
pub const TOKEN_ID_LEN: usize = 59;

const HEX_LEN: usize = 54;

/// Check whether a string is a well-formed token id.
pub fn is_valid_token_id(token: &str) -> bool {
    if token.len() != TOKEN_ID_LEN || !token.is_ascii() {
        return false;
    }
    if !token.starts_with("0x") || !token.ends_with("tok") {
        return false;
    }
    token[2..2 + HEX_LEN]
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Generate a fresh token id for `creator` and `name`.
///
/// Hashes `creator ‖ name ‖ extranonce_u32` with SHA-256d and keeps the
/// first 54 hex characters. On collision with an existing id (as reported
/// by `exists`), the extranonce is bumped and generation retried.
pub fn generate_token_id(creator: &str, name: &str, exists: impl Fn(&str) -> bool) -> String {
    let mut extranonce: u32 = 0;
    loop {
        let hash = sha256d_multi(&[
            creator.as_bytes(),
            name.as_bytes(),
            &extranonce.to_le_bytes(),
        ]);
        let token = format!("0x{}tok", &hex::encode(hash)[..HEX_LEN]);
        if !exists(&token) {
            return token;
        }
        extranonce += 1;
    }
}
