//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify the eligibility predicate, fixed-point
//! formatting, and wire-format round-trips across random inputs.

use alloy::primitives::{Address, U256};
use chrono::Utc;
use proptest::prelude::*;

use prediction_market_sync::domain::events::BroadcastEvent;
use prediction_market_sync::domain::market::{format_units, MarketSnapshot, MarketState};

fn snapshot(state: MarketState, end_time: u64) -> MarketSnapshot {
    MarketSnapshot {
        address: Address::repeat_byte(0x01),
        question: "Q".to_string(),
        description: String::new(),
        end_time,
        state,
        creator: Address::repeat_byte(0x02),
        requires_verification: false,
        total_volume: U256::ZERO,
        total_traders: 0,
        yes_price: U256::ZERO,
        no_price: U256::ZERO,
        yes_shares: U256::ZERO,
        no_shares: U256::ZERO,
        liquidity: U256::ZERO,
        last_updated: Utc::now(),
    }
}

// ── Eligibility Predicate Properties ────────────────────────

proptest! {
    /// Open markets are eligible exactly when the delay has elapsed.
    #[test]
    fn open_market_eligibility_matches_deadline(
        end_time in any::<u64>(),
        delay in 0u64..=1_000_000,
        now in any::<u64>(),
    ) {
        let snap = snapshot(MarketState::Open, end_time);
        let expected = now >= end_time.saturating_add(delay);
        prop_assert_eq!(snap.resolution_eligible(now, delay), expected);
    }

    /// Non-open markets are never eligible, whatever the timing.
    #[test]
    fn non_open_markets_never_eligible(
        end_time in any::<u64>(),
        delay in 0u64..=1_000_000,
        now in any::<u64>(),
        resolved in any::<bool>(),
    ) {
        let state = if resolved {
            MarketState::Resolved
        } else {
            MarketState::Closed
        };
        let snap = snapshot(state, end_time);
        prop_assert!(!snap.resolution_eligible(now, delay));
    }
}

// ── Fixed-point Formatting Properties ───────────────────────

proptest! {
    /// Formatting never loses information: integer and fractional
    /// parts reassemble into the original raw value.
    #[test]
    fn format_units_is_lossless(
        value in any::<u128>(),
        decimals in 0u8..=18,
    ) {
        let formatted = format_units(U256::from(value), decimals);
        let (int_part, frac_part) = formatted
            .split_once('.')
            .expect("always has a fractional part");

        let scale = U256::from(10u64).pow(U256::from(decimals));
        let int_val: U256 = int_part.parse().expect("integer part parses");
        // Undo the trailing-zero trim before parsing the fraction
        let frac_padded =
            format!("{frac_part:0<width$}", width = usize::from(decimals.max(1)));
        let frac_val: U256 = frac_padded.parse().expect("fraction parses");

        prop_assert_eq!(int_val * scale + frac_val, U256::from(value));
    }
}

// ── Wire Format Round-trips ─────────────────────────────────

proptest! {
    /// Trade pushes survive a serialize/deserialize round-trip,
    /// including arbitrarily large share quantities.
    #[test]
    fn trade_event_round_trips(
        shares in any::<u128>(),
        yes_price in any::<u64>(),
        no_price in any::<u64>(),
        is_yes in any::<bool>(),
    ) {
        let event = BroadcastEvent::Trade {
            market: Address::repeat_byte(0xaa),
            buyer: Address::repeat_byte(0xbb),
            is_yes,
            shares: U256::from(shares),
            yes_price: U256::from(yes_price),
            no_price: U256::from(no_price),
        };

        let json = serde_json::to_string(&event).expect("serializes");
        let back: BroadcastEvent = serde_json::from_str(&json).expect("deserializes");
        prop_assert_eq!(back, event);
    }

    /// Snapshots round-trip through their JSON wire format.
    #[test]
    fn snapshot_round_trips(
        end_time in any::<u64>(),
        volume in any::<u128>(),
        state_raw in 0u8..=2,
    ) {
        let mut snap = snapshot(MarketState::from_contract(state_raw), end_time);
        snap.total_volume = U256::from(volume);

        let json = serde_json::to_string(&snap).expect("serializes");
        let back: MarketSnapshot = serde_json::from_str(&json).expect("deserializes");
        prop_assert_eq!(back, snap);
    }
}
