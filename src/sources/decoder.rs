use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;

use super::RawApprovalLog;
use crate::approvals::types::ApprovalEvent;

// Generate the Approval event ABI using alloy's sol! macro.
// This gives us Approval::SIGNATURE_HASH for the topic0 filter.
sol! {
    event Approval(address indexed owner, address indexed spender, uint256 value);
}

/// `symbol()` selector.
pub const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];

/// Longest symbol accepted from an on-chain `symbol()` call.
const MAX_SYMBOL_LEN: usize = 100;

/// Attempt to decode a provider log as an ERC-20 Approval event.
///
/// Returns `None` if:
/// - fewer than 3 topics are present (signature + owner + spender)
/// - topic0 is present but is not the Approval signature
///
/// The allowance is the first 32-byte word of `data`; shorter data is read as a
/// big-endian integer and empty data decodes to zero.
pub fn decode_approval_log(log: &RawApprovalLog) -> Option<ApprovalEvent> {
    if log.topics.len() < 3 || log.topics[0] != Approval::SIGNATURE_HASH {
        return None;
    }

    let spender = Address::from_word(log.topics[2]);
    let data = log.data.as_ref();
    let word = &data[..data.len().min(32)];
    let allowance = U256::from_be_slice(word);

    Some(ApprovalEvent {
        token: log.token,
        spender,
        allowance,
        block_number: log.block_number,
    })
}

/// Decode an ABI-encoded dynamic `string` return value.
///
/// Layout: 32-byte offset, 32-byte length, then the bytes. Returns an empty
/// string when the payload is short, the length is zero or over 100 bytes, or
/// the bytes are not UTF-8.
pub fn decode_abi_string(data: &Bytes) -> String {
    if data.len() < 64 {
        return String::new();
    }

    let length = U256::from_be_slice(&data[32..64]);
    if length.is_zero() || length > U256::from(MAX_SYMBOL_LEN) {
        return String::new();
    }
    let len = length.to::<usize>();

    if data.len() < 64 + len {
        return String::new();
    }

    String::from_utf8(data[64..64 + len].to_vec()).unwrap_or_default()
}
