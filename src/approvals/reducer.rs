use alloy::primitives::{Address, U256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::types::ApprovalEvent;

/// Allowances at or above half of `U256::MAX` are treated as unlimited.
pub const UNLIMITED_THRESHOLD: U256 = U256::from_limbs([
    u64::MAX,
    u64::MAX,
    u64::MAX,
    u64::MAX >> 1,
]);

pub fn is_unlimited(allowance: U256) -> bool {
    allowance >= UNLIMITED_THRESHOLD
}

/// Collapse an event stream into the latest state per (token, spender).
///
/// Zero-allowance events are discarded before reduction and never touch an
/// earlier grant. Of the remaining events the last one for a pair wins, in
/// provider response order rather than block order.
pub fn reduce(events: impl IntoIterator<Item = ApprovalEvent>) -> Vec<ApprovalEvent> {
    let mut latest: HashMap<(Address, Address), (usize, ApprovalEvent)> = HashMap::new();

    for (seq, event) in events.into_iter().enumerate() {
        if event.allowance.is_zero() {
            continue;
        }
        match latest.entry((event.token, event.spender)) {
            Entry::Occupied(mut slot) => slot.get_mut().1 = event,
            Entry::Vacant(slot) => {
                slot.insert((seq, event));
            }
        }
    }

    // Output follows the order in which each pair was first seen.
    let mut survivors: Vec<(usize, ApprovalEvent)> = latest.into_values().collect();
    survivors.sort_by_key(|(seq, _)| *seq);
    survivors.into_iter().map(|(_, event)| event).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const TOKEN_A: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    const TOKEN_B: Address = address!("dac17f958d2ee523a2206206994597c13d831ec7");
    const SPENDER: Address = address!("7a250d5630b4cf539739df2c5dacb4c659f2488d");

    fn event(token: Address, spender: Address, allowance: u64) -> ApprovalEvent {
        ApprovalEvent {
            token,
            spender,
            allowance: U256::from(allowance),
            block_number: None,
        }
    }

    #[test]
    fn test_threshold_is_half_of_max() {
        assert_eq!(UNLIMITED_THRESHOLD, U256::MAX / U256::from(2));
        assert!(is_unlimited(UNLIMITED_THRESHOLD));
        assert!(!is_unlimited(UNLIMITED_THRESHOLD - U256::from(1)));
        assert!(is_unlimited(U256::MAX));
        assert!(is_unlimited(U256::from(1) << 255));
        assert!(!is_unlimited(U256::from(500_000_000u64)));
    }

    #[test]
    fn test_last_event_wins() {
        let reduced = reduce(vec![
            event(TOKEN_A, SPENDER, 100),
            event(TOKEN_B, SPENDER, 5),
            event(TOKEN_A, SPENDER, 300),
        ]);
        assert_eq!(reduced.len(), 2);
        let a = reduced.iter().find(|e| e.token == TOKEN_A).unwrap();
        assert_eq!(a.allowance, U256::from(300));
    }

    #[test]
    fn test_last_event_wins_regardless_of_block_number() {
        let mut newer = event(TOKEN_A, SPENDER, 100);
        newer.block_number = Some(200);
        let mut older = event(TOKEN_A, SPENDER, 7);
        older.block_number = Some(10);

        let reduced = reduce(vec![newer, older]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].allowance, U256::from(7));
    }

    #[test]
    fn test_zero_allowance_discarded() {
        assert!(reduce(vec![event(TOKEN_A, SPENDER, 0)]).is_empty());

        let reduced = reduce(vec![
            event(TOKEN_A, SPENDER, 100),
            event(TOKEN_A, SPENDER, 0),
            event(TOKEN_B, SPENDER, 9),
        ]);
        assert_eq!(
            reduced,
            vec![event(TOKEN_A, SPENDER, 100), event(TOKEN_B, SPENDER, 9)]
        );
    }

    #[test]
    fn test_output_in_first_seen_order() {
        let reduced = reduce(vec![
            event(TOKEN_A, SPENDER, 1),
            event(TOKEN_B, SPENDER, 2),
            event(TOKEN_A, SPENDER, 3),
        ]);
        assert_eq!(
            reduced,
            vec![event(TOKEN_A, SPENDER, 3), event(TOKEN_B, SPENDER, 2)]
        );
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let once = reduce(vec![
            event(TOKEN_A, SPENDER, 1),
            event(TOKEN_B, SPENDER, 2),
            event(TOKEN_A, SPENDER, 3),
            event(TOKEN_B, SPENDER, 0),
            event(TOKEN_B, TOKEN_A, 4),
        ]);
        let twice = reduce(once.clone());
        assert_eq!(once, twice);
    }
}
