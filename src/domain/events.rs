//! Wire messages for the real-time feed.
//!
//! `BroadcastEvent` is the server push sent to every live connection;
//! `ClientCommand` / `ControlReply` are the small control protocol a
//! client speaks after connecting. Tags and field names are part of
//! the public protocol and must not change casing.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::market::u256_dec;

/// A state change pushed to every connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastEvent {
    /// A new market was created through the factory.
    NewMarket {
        market: Address,
        question: String,
        creator: Address,
    },
    /// Shares were purchased on a market.
    #[serde(rename_all = "camelCase")]
    Trade {
        market: Address,
        buyer: Address,
        is_yes: bool,
        #[serde(with = "u256_dec")]
        shares: U256,
        #[serde(with = "u256_dec")]
        yes_price: U256,
        #[serde(with = "u256_dec")]
        no_price: U256,
    },
    /// A market's outcome was finalized.
    MarketResolved { market: Address, outcome: bool },
}

impl BroadcastEvent {
    /// Market address this event concerns.
    pub fn market(&self) -> Address {
        match self {
            Self::NewMarket { market, .. }
            | Self::Trade { market, .. }
            | Self::MarketResolved { market, .. } => *market,
        }
    }
}

/// Commands a client may send over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Declare the set of markets the client is interested in.
    Subscribe {
        #[serde(default)]
        markets: Vec<Address>,
    },
}

/// Replies to client commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlReply {
    /// Acknowledges a subscribe command, echoing the accepted set.
    Subscribed { markets: Vec<Address> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_market_wire_format() {
        let event = BroadcastEvent::NewMarket {
            market: Address::from_str("0x00000000000000000000000000000000000000aa").unwrap(),
            question: "Q".to_string(),
            creator: Address::from_str("0x00000000000000000000000000000000000000cc").unwrap(),
        };
        let json = serde_json::to_value(&event).expect("event serializes");
        assert_eq!(json["type"], "new_market");
        assert_eq!(json["question"], "Q");
        assert_eq!(
            json["market"].as_str().unwrap().to_lowercase(),
            "0x00000000000000000000000000000000000000aa"
        );
    }

    #[test]
    fn test_trade_wire_format() {
        let event = BroadcastEvent::Trade {
            market: Address::ZERO,
            buyer: Address::ZERO,
            is_yes: true,
            shares: U256::from(42u64),
            yes_price: U256::from(7u64),
            no_price: U256::from(3u64),
        };
        let json = serde_json::to_value(&event).expect("event serializes");
        assert_eq!(json["type"], "trade");
        assert_eq!(json["isYes"], true);
        assert_eq!(json["shares"], "42");
        assert_eq!(json["yesPrice"], "7");
        assert_eq!(json["noPrice"], "3");
    }

    #[test]
    fn test_subscribe_round_trip() {
        let raw = r#"{"type":"subscribe","markets":["0x00000000000000000000000000000000000000aa"]}"#;
        let cmd: ClientCommand = serde_json::from_str(raw).expect("subscribe parses");
        let ClientCommand::Subscribe { markets } = cmd;
        assert_eq!(markets.len(), 1);

        let reply = ControlReply::Subscribed { markets };
        let json = serde_json::to_value(&reply).expect("reply serializes");
        assert_eq!(json["type"], "subscribed");
    }

    #[test]
    fn test_subscribe_without_markets_defaults_empty() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"subscribe"}"#).expect("parses");
        let ClientCommand::Subscribe { markets } = cmd;
        assert!(markets.is_empty());
    }
}
