//! Integration tests for `AlchemyClient` against a mock JSON-RPC endpoint.

use chainvox_core::{AlchemyClient, ChainDataProvider, ChainError, RetryConfig, TokenStandard};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WALLET: &str = "0x1234567890abcdef1234567890abcdef12345678";
const TOKEN: &str = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";

fn client(server: &MockServer) -> AlchemyClient {
    AlchemyClient::new(&server.uri(), Duration::from_secs(5), RetryConfig::none())
        .unwrap_or_else(|e| panic!("client should build: {e}"))
}

async fn mount_rpc(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result })),
        )
        .mount(server)
        .await;
}

// ── Wallet Analysis ────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_address_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server).get_wallet_analysis("0x1234").await;
    assert_eq!(result, Err(ChainError::InvalidAddress("0x1234".to_string())));
}

#[tokio::test]
async fn test_wallet_analysis_with_tokens() {
    let server = MockServer::start().await;
    mount_rpc(&server, "eth_getBalance", json!("0x14d1120d7b160000")).await; // 1.5 ETH
    mount_rpc(&server, "eth_getTransactionCount", json!("0x2a")).await;
    mount_rpc(&server, "eth_getCode", json!("0x")).await;
    mount_rpc(
        &server,
        "alchemy_getTokenBalances",
        json!({
            "address": WALLET,
            "tokenBalances": [
                { "contractAddress": TOKEN, "tokenBalance": "0x1e8480" },
                { "contractAddress": "0x9999999999999999999999999999999999999999", "tokenBalance": "0x0" }
            ]
        }),
    )
    .await;
    mount_rpc(
        &server,
        "alchemy_getTokenMetadata",
        json!({ "name": "USD Coin", "symbol": "USDC", "decimals": 6, "logo": null }),
    )
    .await;

    let analysis = client(&server)
        .get_wallet_analysis(WALLET)
        .await
        .unwrap_or_else(|e| panic!("analysis should succeed: {e}"));

    assert_eq!(analysis.eth_balance, "1.5");
    assert_eq!(analysis.transaction_count, 42);
    assert!(!analysis.is_contract);
    assert!(!analysis.looks_inactive());

    // Zero balances are dropped
    assert_eq!(analysis.token_balances.len(), 1);
    let usdc = &analysis.token_balances[0];
    assert_eq!(usdc.contract_address, TOKEN);
    assert_eq!(usdc.symbol.as_deref(), Some("USDC"));
    assert_eq!(usdc.amount, "2");
}

#[tokio::test]
async fn test_empty_wallet_and_metadata_failure() {
    let server = MockServer::start().await;
    mount_rpc(&server, "eth_getBalance", json!("0x0")).await;
    mount_rpc(&server, "eth_getTransactionCount", json!("0x0")).await;
    mount_rpc(&server, "eth_getCode", json!("0x6080604052")).await;
    mount_rpc(
        &server,
        "alchemy_getTokenBalances",
        json!({ "address": WALLET, "tokenBalances": [{ "contractAddress": TOKEN, "tokenBalance": "0x64" }] }),
    )
    .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "alchemy_getTokenMetadata" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let analysis = client(&server)
        .get_wallet_analysis(WALLET)
        .await
        .unwrap_or_else(|e| panic!("metadata failure must not fail the analysis: {e}"));

    assert!(analysis.is_contract);
    assert_eq!(analysis.eth_balance, "0");
    let token = &analysis.token_balances[0];
    assert_eq!(token.symbol_or_marker(), "[missing]");
    assert_eq!(token.name_or_marker(), "[missing]");
    assert_eq!(token.amount, "100");
}

#[tokio::test]
async fn test_uppercase_prefix_is_sent_as_lowercase_0x() {
    let server = MockServer::start().await;
    let spoken = format!("0X{}", "a".repeat(40));
    let rpc = format!("0x{}", "a".repeat(40));

    for rpc_method in ["eth_getBalance", "eth_getTransactionCount", "eth_getCode"] {
        let result = if rpc_method == "eth_getCode" { "0x" } else { "0x0" };
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method, "params": [rpc, "latest"] })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result })),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "alchemy_getTokenBalances", "params": [rpc, "erc20"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "address": rpc, "tokenBalances": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let analysis = client(&server)
        .get_wallet_analysis(&spoken)
        .await
        .unwrap_or_else(|e| panic!("0X-prefixed address should be analyzed: {e}"));

    assert_eq!(analysis.address, spoken);
    assert!(analysis.looks_inactive());
}

// ── Mints, Gas, Blocks ─────────────────────────────────────────────

#[tokio::test]
async fn test_recent_mints_filter_and_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "alchemy_getAssetTransfers",
            "params": [{
                "fromAddress": "0x0000000000000000000000000000000000000000",
                "category": ["erc721", "erc1155"],
                "order": "desc",
                "maxCount": "0x7"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "transfers": [
                    {
                        "hash": "0xaaa",
                        "blockNum": "0x100",
                        "from": "0x0000000000000000000000000000000000000000",
                        "to": WALLET,
                        "asset": "Based Ghouls",
                        "category": "erc721",
                        "erc721TokenId": "0x05",
                        "rawContract": { "address": "0x2222222222222222222222222222222222222222" },
                        "metadata": { "blockTimestamp": "2024-05-01T12:00:00.000Z" }
                    },
                    {
                        "hash": "0xbbb",
                        "blockNum": "0xff",
                        "from": "0x0000000000000000000000000000000000000000",
                        "to": WALLET,
                        "category": "erc1155",
                        "erc1155Metadata": [{ "tokenId": "0x1", "value": "0x1" }],
                        "rawContract": { "address": "0x3333333333333333333333333333333333333333" }
                    }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mints = client(&server)
        .get_recent_mints(7)
        .await
        .unwrap_or_else(|e| panic!("mints should load: {e}"));

    assert_eq!(mints.len(), 2);
    assert_eq!(mints[0].block_number, "256");
    assert_eq!(mints[0].token_id.as_deref(), Some("5"));
    assert_eq!(mints[0].collection_label.as_deref(), Some("Based Ghouls"));
    assert_eq!(mints[0].minter_address, WALLET);
    assert_eq!(mints[1].token_standard, TokenStandard::Erc1155);
    assert!(mints[1].collection_label.is_none());
}

#[tokio::test]
async fn test_collection_filter_is_sent() {
    let server = MockServer::start().await;
    let collection = "0x2222222222222222222222222222222222222222";
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "alchemy_getAssetTransfers",
            "params": [{ "contractAddresses": [collection] }]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": { "transfers": [] } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mints = client(&server)
        .get_recent_mints_for(3, Some(collection))
        .await
        .unwrap_or_else(|e| panic!("mints should load: {e}"));
    assert!(mints.is_empty());
}

#[tokio::test]
async fn test_gas_price_and_block_number() {
    let server = MockServer::start().await;
    mount_rpc(&server, "eth_gasPrice", json!("0x3b9aca00")).await; // 1 gwei
    mount_rpc(&server, "eth_blockNumber", json!("0x1b4")).await;

    let chain = client(&server);
    assert_eq!(chain.get_gas_price().await, Ok("1.00 Gwei".to_string()));
    assert_eq!(chain.get_latest_block().await, Ok("436".to_string()));
}

// ── Failure Mapping ────────────────────────────────────────────────

#[tokio::test]
async fn test_http_429_is_rate_limited_and_retry_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let retry = RetryConfig {
        max_attempts: 2,
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter: false,
    };
    let chain = AlchemyClient::new(&server.uri(), Duration::from_secs(5), retry)
        .unwrap_or_else(|e| panic!("client should build: {e}"));

    assert_eq!(chain.get_latest_block().await, Err(ChainError::RateLimited));
}

#[tokio::test]
async fn test_server_error_is_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let result = client(&server).get_gas_price().await;
    assert!(matches!(result, Err(ChainError::NetworkFailure(msg)) if msg.contains("503")));
}

#[tokio::test]
async fn test_unparseable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client(&server).get_latest_block().await;
    assert!(matches!(result, Err(ChainError::Malformed(_))));
}
