//! End-to-end dispatch tests: real chain and model clients, mocked HTTP.

use chainvox_core::{
    AlchemyClient, ConversationContext, ConversationSession, ModelConfig, OpenAiClient,
    QueryDispatcher, RetryConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMPTY_WALLET: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

async fn mount_rpc(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result })),
        )
        .mount(server)
        .await;
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    }))
}

fn dispatcher(server: &MockServer) -> QueryDispatcher {
    let chain = AlchemyClient::new(
        &format!("{}/rpc", server.uri()),
        Duration::from_secs(5),
        RetryConfig::none(),
    )
    .unwrap_or_else(|e| panic!("chain client should build: {e}"));

    let model = OpenAiClient::new(
        &ModelConfig {
            api_key: Some("sk-test".to_string()),
            base_url: format!("{}/v1", server.uri()),
            model: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            request_timeout_secs: 5,
        },
        RetryConfig::none(),
    )
    .unwrap_or_else(|e| panic!("model client should build: {e}"));

    QueryDispatcher::new(Arc::new(chain), Arc::new(model), 7)
}

#[tokio::test]
async fn test_empty_wallet_reply_flags_inactivity() {
    let server = MockServer::start().await;
    mount_rpc(&server, "eth_getBalance", json!("0x0")).await;
    mount_rpc(&server, "eth_getTransactionCount", json!("0x0")).await;
    mount_rpc(&server, "eth_getCode", json!("0x")).await;
    mount_rpc(
        &server,
        "alchemy_getTokenBalances",
        json!({ "address": EMPTY_WALLET, "tokenBalances": [] }),
    )
    .await;

    // The model only sees the facts; the prompt must carry the zeros
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("ETH balance: 0 ETH"))
        .and(body_string_contains("Outgoing transaction count: 0"))
        .respond_with(completion("This wallet is empty."))
        .expect(1)
        .mount(&server)
        .await;

    let reply = dispatcher(&server)
        .dispatch(EMPTY_WALLET, &ConversationContext::new())
        .await;

    assert!(reply.starts_with("This wallet is empty."));
    assert!(reply.contains("zero ETH balance"));
    assert!(reply.contains("zero transactions"));
    assert!(reply.contains("inactive or not yet indexed"));
}

#[tokio::test]
async fn test_no_recent_mints_is_stated() {
    let server = MockServer::start().await;
    mount_rpc(&server, "alchemy_getAssetTransfers", json!({ "transfers": [] })).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("No recent mints were found"))
        .respond_with(completion("No recent mints were found on Base just now."))
        .expect(1)
        .mount(&server)
        .await;

    let reply = dispatcher(&server)
        .dispatch("show me recent mints", &ConversationContext::new())
        .await;

    assert!(!reply.is_empty());
    assert!(reply.contains("No recent mints were found"));
}

#[tokio::test]
async fn test_no_recent_mints_without_model() {
    let server = MockServer::start().await;
    mount_rpc(&server, "alchemy_getAssetTransfers", json!({ "transfers": [] })).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let reply = dispatcher(&server)
        .dispatch("show me recent mints", &ConversationContext::new())
        .await;

    assert_eq!(reply, "No recent mints were found on Base.");
}

#[tokio::test]
async fn test_unavailable_model_apologizes_with_question() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let reply = dispatcher(&server)
        .dispatch("how do rollups work", &ConversationContext::new())
        .await;

    assert!(reply.starts_with("Sorry"));
    assert!(reply.contains("how do rollups work"));
}

#[tokio::test]
async fn test_session_carries_history_into_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("what is Base"))
        .and(body_string_contains("and who runs it"))
        .respond_with(completion("Coinbase incubated it."))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("Base is an Ethereum L2."))
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server);
    let mut session = ConversationSession::new();

    let first = session.ask(&dispatcher, "what is Base").await;
    assert_eq!(first.as_deref(), Some("Base is an Ethereum L2."));

    let second = session.ask(&dispatcher, "and who runs it").await;
    assert_eq!(second.as_deref(), Some("Coinbase incubated it."));
    assert_eq!(session.history().len(), 4);

    assert!(session.ask(&dispatcher, "   ").await.is_none());
    assert_eq!(session.history().len(), 4);
}
