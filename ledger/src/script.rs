//! OP_RETURN script construction and parsing for on-chain operation
//! records.
//!
//! An operation is embedded as `OP_RETURN <pushdata>` where the pushdata
//! is the canonical operation serialization. Encoding always uses the
//! minimal push form; decoding accepts every pushdata variant.

const OP_RETURN: u8 = 0x6a;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;

/// Build an `OP_RETURN` script carrying `payload`.
pub fn op_return_script(payload: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(payload.len() + 5);
    script.push(OP_RETURN);
    match payload.len() {
        0..=0x4b => script.push(payload.len() as u8),
        0x4c..=0xFF => {
            script.push(OP_PUSHDATA1);
            script.push(payload.len() as u8);
        }
        0x100..=0xFFFF => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        }
        _ => {
            script.push(OP_PUSHDATA4);
            script.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(payload);
    script
}

/// Extract the pushdata from an `OP_RETURN` script.
///
/// Returns `None` when the script is not an OP_RETURN, carries no data,
/// or the declared push length disagrees with the script body.
pub fn parse_op_return(script: &[u8]) -> Option<&[u8]> {
    let (&first, rest) = script.split_first()?;
    if first != OP_RETURN {
        return None;
    }

    let (&push, rest) = rest.split_first()?;
    let (len, data) = match push {
        0x01..=0x4b => (push as usize, rest),
        OP_PUSHDATA1 => {
            let (&len, data) = rest.split_first()?;
            (len as usize, data)
        }
        OP_PUSHDATA2 => {
            let bytes: [u8; 2] = rest.get(..2)?.try_into().ok()?;
            (u16::from_le_bytes(bytes) as usize, &rest[2..])
        }
        OP_PUSHDATA4 => {
            let bytes: [u8; 4] = rest.get(..4)?.try_into().ok()?;
            (u32::from_le_bytes(bytes) as usize, &rest[4..])
        }
        _ => return None,
    };

    if len == 0 || data.len() != len {
        return None;
    }
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_payload_round_trips() {
        let payload = b"token-op-bytes";
        let script = op_return_script(payload);
        assert_eq!(parse_op_return(&script), Some(payload.as_slice()));
    }

    #[test]
    fn pushdata1_payload_round_trips() {
        let payload = vec![0xAB; 200];
        let script = op_return_script(&payload);
        assert_eq!(script[1], OP_PUSHDATA1);
        assert_eq!(parse_op_return(&script), Some(payload.as_slice()));
    }

    #[test]
    fn pushdata2_payload_round_trips() {
        let payload = vec![0xCD; 600];
        let script = op_return_script(&payload);
        assert_eq!(script[1], OP_PUSHDATA2);
        assert_eq!(parse_op_return(&script), Some(payload.as_slice()));
    }

    #[test]
    fn non_op_return_is_ignored() {
        assert_eq!(parse_op_return(&[0x76, 0xa9, 0x14]), None);
        assert_eq!(parse_op_return(&[]), None);
    }

    #[test]
    fn empty_payload_is_ignored() {
        assert_eq!(parse_op_return(&[OP_RETURN]), None);
        assert_eq!(parse_op_return(&[OP_RETURN, 0x00]), None);
    }

    #[test]
    fn length_mismatch_is_ignored() {
        // Declares 5 bytes of data, provides 3.
        assert_eq!(parse_op_return(&[OP_RETURN, 5, 1, 2, 3]), None);
        // Declares 2, provides 4.
        assert_eq!(parse_op_return(&[OP_RETURN, 2, 1, 2, 3, 4]), None);
    }
}
