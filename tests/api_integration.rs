//! Integration Tests - HTTP + WebSocket Surface
//!
//! Boots the real axum application on an ephemeral port with mocked
//! chain access, then exercises it the way clients do: REST via
//! reqwest, the live feed via a tokio-tungstenite WebSocket client.

use std::net::SocketAddr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use futures_util::{SinkExt, StreamExt};
use mockall::mock;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

use prediction_market_sync::adapters::api::{build_router, AppState};
use prediction_market_sync::adapters::metrics::MetricsRegistry;
use prediction_market_sync::config::{
    AppConfig, CacheConfig, ChainConfig, SchedulerConfig, ServerConfig, ServiceConfig,
};
use prediction_market_sync::domain::events::BroadcastEvent;
use prediction_market_sync::ports::chain_reader::{
    ChainEvent, ChainReader, MarketInfo, PoolState,
};
use prediction_market_sync::ports::resolution::{ResolutionError, ResolutionSubmitter};
use prediction_market_sync::usecases::engine::SyncEngine;

mock! {
    pub Reader {}

    #[async_trait::async_trait]
    impl ChainReader for Reader {
        async fn block_number(&self) -> anyhow::Result<u64>;

        async fn factory_markets(&self, factory: Address) -> anyhow::Result<Vec<Address>>;

        async fn factory_events(
            &self,
            factory: Address,
            from_exclusive: u64,
            to_inclusive: u64,
        ) -> anyhow::Result<Vec<ChainEvent>>;

        async fn market_events(
            &self,
            market: Address,
            from_exclusive: u64,
            to_inclusive: u64,
        ) -> anyhow::Result<Vec<ChainEvent>>;

        async fn market_info(&self, market: Address) -> anyhow::Result<MarketInfo>;

        async fn yes_price(&self, market: Address) -> anyhow::Result<U256>;

        async fn no_price(&self, market: Address) -> anyhow::Result<U256>;

        async fn pool_info(&self, market: Address) -> anyhow::Result<PoolState>;

        async fn user_balance(
            &self,
            market: Address,
            user: Address,
        ) -> anyhow::Result<(U256, U256)>;

        async fn is_healthy(&self) -> bool;
    }
}

mock! {
    pub Submitter {}

    #[async_trait::async_trait]
    impl ResolutionSubmitter for Submitter {
        async fn resolve(
            &self,
            market: Address,
            outcome: bool,
        ) -> Result<String, ResolutionError>;

        async fn submit_vote(
            &self,
            market: Address,
            outcome: bool,
        ) -> Result<String, ResolutionError>;
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        service: ServiceConfig {
            name: "sync-test".to_string(),
            log_level: "warn".to_string(),
        },
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
        },
        chain: ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            factory_address: None,
            poll_interval_secs: 5,
        },
        cache: CacheConfig {
            sweep_interval_secs: 60,
        },
        scheduler: SchedulerConfig {
            check_interval_secs: 300,
            resolution_delay_secs: 3600,
            oracle_address: None,
        },
    }
}

/// Known market served by the mock reader in `known_market_reader`.
fn known_market() -> Address {
    Address::repeat_byte(0xaa)
}

fn known_market_reader() -> MockReader {
    let market = known_market();
    let mut reader = MockReader::new();

    reader.expect_market_info().returning(move |m| {
        anyhow::ensure!(m == market, "unknown market {m}");
        Ok(MarketInfo {
            question: "Will it rain tomorrow?".to_string(),
            description: "Resolved by the local weather station".to_string(),
            end_time: 2_000_000_000,
            state: 0,
            creator: Address::repeat_byte(0xcc),
            requires_verification: false,
            total_volume: U256::from(1_000u64),
            total_traders: U256::from(5u64),
        })
    });
    reader.expect_yes_price().returning(move |m| {
        anyhow::ensure!(m == market, "unknown market {m}");
        Ok(U256::from(500_000_000_000_000_000u128))
    });
    reader.expect_no_price().returning(move |m| {
        anyhow::ensure!(m == market, "unknown market {m}");
        Ok(U256::from(500_000_000_000_000_000u128))
    });
    reader.expect_pool_info().returning(move |m| {
        anyhow::ensure!(m == market, "unknown market {m}");
        Ok(PoolState {
            yes_shares: U256::from(10_000_000_000_000_000_000u128),
            no_shares: U256::from(10_000_000_000_000_000_000u128),
            liquidity: U256::from(2_500_000u64),
        })
    });
    reader
        .expect_user_balance()
        .returning(|_, _| Ok((U256::from(3_000_000_000_000_000_000u128), U256::ZERO)));

    reader
}

async fn spawn_app(
    reader: MockReader,
    submitter: Option<Arc<dyn ResolutionSubmitter>>,
) -> (SocketAddr, Arc<SyncEngine>) {
    let engine = Arc::new(SyncEngine::new(test_config(), Arc::new(reader), submitter));
    let metrics = Arc::new(MetricsRegistry::new().expect("metrics registry"));
    let app = build_router(AppState {
        engine: Arc::clone(&engine),
        metrics,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server runs");
    });

    (addr, engine)
}

#[tokio::test]
async fn test_health_endpoint() {
    let mut reader = MockReader::new();
    reader.expect_is_healthy().returning(|| true);
    let (addr, _engine) = spawn_app(reader, None).await;

    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");

    assert_eq!(body["status"], "ok");
    assert_eq!(body["chain"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_market_routes() {
    let (addr, _engine) = spawn_app(known_market_reader(), None).await;
    let market = known_market();
    let client = reqwest::Client::new();

    // Empty cache at startup
    let body: Value = client
        .get(format!("http://{addr}/api/markets"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);

    // Fetching one market refreshes it into the cache
    let body: Value = client
        .get(format!("http://{addr}/api/markets/{market:?}"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["market"]["question"], "Will it rain tomorrow?");
    assert_eq!(body["market"]["state"], "open");
    assert_eq!(body["market"]["yesPrice"], "500000000000000000");

    // Now listed
    let body: Value = client
        .get(format!("http://{addr}/api/markets"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["count"], 1);

    // Unknown market: refresh fails, nothing cached -> 404
    let unknown = Address::repeat_byte(0x99);
    let response = client
        .get(format!("http://{addr}/api/markets/{unknown:?}"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Market not found");

    // Malformed address -> 400
    let response = client
        .get(format!("http://{addr}/api/markets/not-an-address"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_price_pool_and_balance_routes() {
    let (addr, _engine) = spawn_app(known_market_reader(), None).await;
    let market = known_market();
    let user = Address::repeat_byte(0xbb);
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("http://{addr}/api/markets/{market:?}/prices"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["prices"]["yes"], "500000000000000000");
    assert_eq!(body["prices"]["yesFormatted"], "0.5");

    let body: Value = client
        .get(format!("http://{addr}/api/markets/{market:?}/pool"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["pool"]["yesSharesFormatted"], "10.0");
    // Liquidity is 6-decimal USDC
    assert_eq!(body["pool"]["liquidityFormatted"], "2.5");

    let body: Value = client
        .get(format!("http://{addr}/api/markets/{market:?}/user/{user:?}"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["balances"]["yesFormatted"], "3.0");
    assert_eq!(body["balances"]["no"], "0");
}

#[tokio::test]
async fn test_oracle_routes_without_configuration() {
    let (addr, _engine) = spawn_app(MockReader::new(), None).await;
    let client = reqwest::Client::new();

    // Missing fields -> 400 before anything else
    let response = client
        .post(format!("http://{addr}/api/oracle/resolve"))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "marketAddress and outcome (boolean) are required");

    // Valid body, no signer configured -> 503
    let response = client
        .post(format!("http://{addr}/api/oracle/resolve"))
        .json(&json!({
            "marketAddress": format!("{:?}", known_market()),
            "outcome": true,
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 503);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_oracle_routes_with_submitter() {
    let market = known_market();

    let mut submitter = MockSubmitter::new();
    submitter
        .expect_resolve()
        .returning(|_, _| Ok("0xabc123".to_string()));
    submitter
        .expect_submit_vote()
        .returning(|_, _| Ok("0xdef456".to_string()));

    let (addr, _engine) =
        spawn_app(MockReader::new(), Some(Arc::new(submitter))).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("http://{addr}/api/oracle/resolve"))
        .json(&json!({ "marketAddress": format!("{market:?}"), "outcome": true }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["transactionHash"], "0xabc123");

    let body: Value = client
        .post(format!("http://{addr}/api/oracle/vote"))
        .json(&json!({ "marketAddress": format!("{market:?}"), "outcome": false }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["transactionHash"], "0xdef456");
}

#[tokio::test]
async fn test_websocket_subscribe_and_push() {
    let (addr, engine) = spawn_app(MockReader::new(), None).await;
    let market = known_market();

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("ws connect");

    // Subscribe and read the ack
    socket
        .send(Message::Text(
            json!({ "type": "subscribe", "markets": [format!("{market:?}")] }).to_string(),
        ))
        .await
        .expect("send subscribe");

    let ack = socket.next().await.expect("ack frame").expect("ws ok");
    let ack: Value = serde_json::from_str(ack.to_text().expect("text frame")).expect("json");
    assert_eq!(ack["type"], "subscribed");
    assert_eq!(ack["markets"].as_array().expect("array").len(), 1);

    // A broadcast lands on the connected client
    engine.hub().broadcast(&BroadcastEvent::MarketResolved {
        market,
        outcome: true,
    });

    let push = socket.next().await.expect("push frame").expect("ws ok");
    let push: Value = serde_json::from_str(push.to_text().expect("text frame")).expect("json");
    assert_eq!(push["type"], "market_resolved");
    assert_eq!(push["outcome"], true);

    // Closing removes the connection from the registry
    socket.close(None).await.expect("close");
    for _ in 0..50 {
        if engine.hub().client_count() == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(engine.hub().client_count(), 0);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let (addr, _engine) = spawn_app(MockReader::new(), None).await;

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .expect("request")
        .text()
        .await
        .expect("text body");

    assert!(body.contains("market_sync_cached_markets"));
    assert!(body.contains("market_sync_connected_clients"));
}
