//! Cached market view model.
//!
//! A `MarketSnapshot` is the derived, off-chain view of one binary
//! prediction market, assembled from a complete batch of read-only
//! contract queries. Quantities keep the contract's fixed-point
//! representation (`U256`, 18 decimals for prices and shares, 6 for
//! USDC liquidity) and serialize as decimal strings on the wire.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a market, mirroring the contract's state enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketState {
    /// Trading is open.
    Open,
    /// Past end time, awaiting resolution.
    Closed,
    /// Outcome submitted and finalized.
    Resolved,
}

impl MarketState {
    /// Map the contract's `uint8` state discriminant.
    ///
    /// Unknown discriminants collapse to `Closed`: the market is no
    /// longer tradeable but not provably resolved.
    pub fn from_contract(raw: u8) -> Self {
        match raw {
            0 => Self::Open,
            2 => Self::Resolved,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for MarketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// Point-in-time derived view of one market.
///
/// Always the product of a single successful read batch; a failed
/// refresh never produces a partially-updated snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Market contract address.
    pub address: Address,
    /// Market question text.
    pub question: String,
    /// Longer-form market description.
    pub description: String,
    /// Trading end time (Unix seconds).
    pub end_time: u64,
    /// Lifecycle state.
    pub state: MarketState,
    /// Address that created the market.
    pub creator: Address,
    /// Whether participation requires identity verification.
    pub requires_verification: bool,
    /// Cumulative traded volume (18-decimal fixed point).
    #[serde(with = "u256_dec")]
    pub total_volume: U256,
    /// Number of distinct traders.
    pub total_traders: u64,
    /// Current YES price (18-decimal fixed point).
    #[serde(with = "u256_dec")]
    pub yes_price: U256,
    /// Current NO price (18-decimal fixed point).
    #[serde(with = "u256_dec")]
    pub no_price: U256,
    /// YES shares in the pool.
    #[serde(with = "u256_dec")]
    pub yes_shares: U256,
    /// NO shares in the pool.
    #[serde(with = "u256_dec")]
    pub no_shares: U256,
    /// Pool collateral (6-decimal USDC).
    #[serde(with = "u256_dec")]
    pub liquidity: U256,
    /// When this snapshot was assembled.
    pub last_updated: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Whether this market should be flagged for resolution.
    ///
    /// A market is eligible once it is still `Open` and the resolution
    /// delay has fully elapsed past its end time. Resolved or closed
    /// markets are never flagged.
    pub fn resolution_eligible(&self, now_secs: u64, delay_secs: u64) -> bool {
        self.state == MarketState::Open
            && now_secs >= self.end_time.saturating_add(delay_secs)
    }
}

/// Serialize `U256` as a decimal string (matching the upstream wire
/// format, where bigint fields are stringified base-10).
pub mod u256_dec {
    use alloy::primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<U256>().map_err(de::Error::custom)
    }
}

/// Render a fixed-point `U256` as a human-readable decimal string.
///
/// Behaves like ethers' `formatUnits`: the fractional part keeps at
/// least one digit and drops trailing zeros ("1500000000000000000", 18
/// -> "1.5"; "1000000", 6 -> "1.0").
pub fn format_units(value: U256, decimals: u8) -> String {
    let scale = U256::from(10u64).pow(U256::from(decimals));
    let integer = value / scale;
    let fraction = value % scale;

    let mut frac_str = format!(
        "{:0>width$}",
        fraction.to_string(),
        width = decimals as usize
    );
    while frac_str.len() > 1 && frac_str.ends_with('0') {
        frac_str.pop();
    }

    format!("{integer}.{frac_str}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: MarketState, end_time: u64) -> MarketSnapshot {
        MarketSnapshot {
            address: Address::ZERO,
            question: "Will it rain tomorrow?".to_string(),
            description: String::new(),
            end_time,
            state,
            creator: Address::ZERO,
            requires_verification: false,
            total_volume: U256::ZERO,
            total_traders: 0,
            yes_price: U256::from(500_000_000_000_000_000u64),
            no_price: U256::from(500_000_000_000_000_000u64),
            yes_shares: U256::ZERO,
            no_shares: U256::ZERO,
            liquidity: U256::ZERO,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_state_from_contract() {
        assert_eq!(MarketState::from_contract(0), MarketState::Open);
        assert_eq!(MarketState::from_contract(1), MarketState::Closed);
        assert_eq!(MarketState::from_contract(2), MarketState::Resolved);
        assert_eq!(MarketState::from_contract(7), MarketState::Closed);
    }

    #[test]
    fn test_eligibility_open_past_delay() {
        let snap = snapshot(MarketState::Open, 1_000);
        assert!(snap.resolution_eligible(4_601, 3_600));
        assert!(snap.resolution_eligible(4_600, 3_600));
        assert!(!snap.resolution_eligible(4_599, 3_600));
    }

    #[test]
    fn test_eligibility_never_for_resolved() {
        let snap = snapshot(MarketState::Resolved, 1_000);
        assert!(!snap.resolution_eligible(u64::MAX, 3_600));
    }

    #[test]
    fn test_snapshot_serde_decimal_strings() {
        let mut snap = snapshot(MarketState::Open, 1_000);
        snap.total_volume = U256::from(123_456u64);
        let json = serde_json::to_value(&snap).expect("snapshot serializes");
        assert_eq!(json["totalVolume"], "123456");
        assert_eq!(json["yesPrice"], "500000000000000000");
        assert_eq!(json["state"], "open");

        let back: MarketSnapshot =
            serde_json::from_value(json).expect("snapshot deserializes");
        assert_eq!(back, snap);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(
            format_units(U256::from(1_500_000_000_000_000_000u128), 18),
            "1.5"
        );
        assert_eq!(format_units(U256::from(1_000_000u64), 6), "1.0");
        assert_eq!(format_units(U256::ZERO, 18), "0.0");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::from(2_000_001u64), 6), "2.000001");
    }
}
