//! ============================================================================
//! Alchemy Chain Client - Wallet Facts & NFT Mint History on Base
//! ============================================================================
//! Read-only queries against an Alchemy-compatible JSON-RPC endpoint:
//! - eth_getBalance / eth_getTransactionCount / eth_getCode
//! - alchemy_getTokenBalances + alchemy_getTokenMetadata
//! - alchemy_getAssetTransfers filtered to mints (from = zero address)
//! - eth_gasPrice / eth_blockNumber
//!
//! Every call is idempotent and goes through the bounded retry policy.
//! ============================================================================

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::rpc::JsonRpcTransport;
use super::units::{
    format_units, hex_to_decimal_lossless, is_zero_hex, parse_hex_u128, parse_hex_u64,
    wei_hex_to_eth, wei_hex_to_gwei_label,
};
use super::ChainDataProvider;
use crate::config::ChainConfig;
use crate::intent::rpc_address;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{ChainError, NftMintEvent, TokenBalance, TokenStandard, WalletAnalysis};

/// Sender of every mint transfer
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Metadata lookups per wallet analysis; remaining tokens keep missing markers
const MAX_METADATA_LOOKUPS: usize = 10;

/// Provider cap on alchemy_getAssetTransfers maxCount
const MAX_TRANSFER_COUNT: u32 = 1000;

/// Chain data client for Alchemy endpoints
pub struct AlchemyClient {
    transport: JsonRpcTransport,
    retry: RetryConfig,
}

impl AlchemyClient {
    /// Create a client for an explicit endpoint
    pub fn new(endpoint: &str, timeout: Duration, retry: RetryConfig) -> Result<Self, ChainError> {
        Ok(Self {
            transport: JsonRpcTransport::new(endpoint, timeout)?,
            retry,
        })
    }

    /// Create a client from configuration (API key + network, or URL override)
    pub fn from_config(config: &ChainConfig, retry: RetryConfig) -> Result<Self, ChainError> {
        let endpoint = config.endpoint().ok_or_else(|| {
            ChainError::NetworkFailure(
                "no chain data endpoint configured (set ALCHEMY_API_KEY or CHAIN_RPC_URL)".into(),
            )
        })?;

        info!("Initializing chain client for {}", config.network.as_str());
        Self::new(&endpoint, config.request_timeout(), retry)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        with_retry(&self.retry, method, || self.transport.call(method, params.clone())).await
    }

    async fn token_metadata(&self, contract: &str) -> Option<TokenMetadata> {
        match self
            .call::<TokenMetadata>("alchemy_getTokenMetadata", json!([contract]))
            .await
        {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("Token metadata unavailable for {}: {}", contract, e);
                None
            }
        }
    }

    async fn token_balances(&self, address: &str) -> Result<Vec<TokenBalance>, ChainError> {
        let raw: TokenBalancesResult = self
            .call("alchemy_getTokenBalances", json!([address, "erc20"]))
            .await?;

        let held: Vec<RawTokenBalance> = raw
            .token_balances
            .into_iter()
            .filter(|t| t.token_balance.as_deref().is_some_and(|b| !is_zero_hex(b)))
            .collect();

        debug!("{} holds {} non-zero token balances", address, held.len());

        let lookups = held
            .iter()
            .take(MAX_METADATA_LOOKUPS)
            .map(|t| self.token_metadata(&t.contract_address));
        let mut metadata = join_all(lookups).await.into_iter();

        Ok(held
            .into_iter()
            .map(|token| {
                let meta = metadata.next().flatten().unwrap_or_default();
                build_token_balance(token, meta)
            })
            .collect())
    }
}

#[async_trait]
impl ChainDataProvider for AlchemyClient {
    async fn get_wallet_analysis(&self, address: &str) -> Result<WalletAnalysis, ChainError> {
        let rpc = rpc_address(address).ok_or_else(|| ChainError::InvalidAddress(address.to_string()))?;

        info!("Analyzing wallet {}", address);

        let (balance, tokens, tx_count, code) = tokio::try_join!(
            self.call::<String>("eth_getBalance", json!([rpc, "latest"])),
            self.token_balances(&rpc),
            self.call::<String>("eth_getTransactionCount", json!([rpc, "latest"])),
            self.call::<String>("eth_getCode", json!([rpc, "latest"])),
        )?;

        Ok(WalletAnalysis {
            address: address.to_string(),
            eth_balance: wei_hex_to_eth(&balance)?,
            token_balances: tokens,
            transaction_count: parse_hex_u64(&tx_count)?,
            is_contract: !code.trim_start_matches("0x").is_empty(),
        })
    }

    async fn get_recent_mints_for(
        &self,
        limit: u32,
        collection: Option<&str>,
    ) -> Result<Vec<NftMintEvent>, ChainError> {
        let collection = collection
            .map(|contract| rpc_address(contract).ok_or_else(|| ChainError::InvalidAddress(contract.to_string())))
            .transpose()?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let limit = limit.min(MAX_TRANSFER_COUNT);
        info!("Fetching {} most recent NFT mints", limit);

        let mut filter = json!({
            "fromBlock": "0x0",
            "toBlock": "latest",
            "fromAddress": ZERO_ADDRESS,
            "category": ["erc721", "erc1155"],
            "order": "desc",
            "withMetadata": true,
            "excludeZeroValue": true,
            "maxCount": format!("0x{:x}", limit),
        });
        if let Some(contract) = collection {
            filter["contractAddresses"] = json!([contract]);
        }

        let result: AssetTransfersResult = self
            .call("alchemy_getAssetTransfers", json!([filter]))
            .await?;

        let mints: Vec<NftMintEvent> = result
            .transfers
            .into_iter()
            .filter_map(|transfer| {
                let event = mint_event_from_transfer(transfer);
                if event.is_none() {
                    warn!("Skipping mint transfer without a recipient");
                }
                event
            })
            .collect();

        debug!("Processed {} NFT mints", mints.len());
        Ok(mints)
    }

    async fn get_gas_price(&self) -> Result<String, ChainError> {
        let wei: String = self.call("eth_gasPrice", json!([])).await?;
        wei_hex_to_gwei_label(&wei)
    }

    async fn get_latest_block(&self) -> Result<String, ChainError> {
        let block: String = self.call("eth_blockNumber", json!([])).await?;
        Ok(parse_hex_u128(&block)?.to_string())
    }
}

fn build_token_balance(token: RawTokenBalance, meta: TokenMetadata) -> TokenBalance {
    let raw = token.token_balance.unwrap_or_default();
    let amount = match (parse_hex_u128(&raw), meta.decimals) {
        (Ok(units), Some(decimals)) => format_units(units, u32::from(decimals)),
        (Ok(units), None) => units.to_string(),
        // Wider than u128 (typically spam tokens minted at uint256::MAX)
        (Err(_), _) => raw,
    };

    TokenBalance {
        contract_address: token.contract_address,
        symbol: non_empty(meta.symbol),
        name: non_empty(meta.name),
        decimals: meta.decimals,
        amount,
    }
}

fn mint_event_from_transfer(transfer: RawTransfer) -> Option<NftMintEvent> {
    let minter_address = transfer.to.filter(|to| !to.is_empty())?;

    let token_id = transfer.erc721_token_id.or_else(|| {
        transfer
            .erc1155_metadata
            .and_then(|items| items.into_iter().next())
            .and_then(|item| item.token_id)
    });

    Some(NftMintEvent {
        tx_hash: transfer.hash,
        block_number: hex_to_decimal_lossless(&transfer.block_num),
        timestamp: transfer.metadata.and_then(|m| m.block_timestamp),
        contract_address: transfer.raw_contract.and_then(|c| c.address),
        token_id: token_id.map(|id| hex_to_decimal_lossless(&id)),
        minter_address,
        collection_label: non_empty(transfer.asset),
        token_standard: transfer
            .category
            .as_deref()
            .map(TokenStandard::from_category)
            .unwrap_or(TokenStandard::Unknown),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalancesResult {
    #[serde(default)]
    token_balances: Vec<RawTokenBalance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenBalance {
    contract_address: String,
    token_balance: Option<String>,
}

#[derive(Deserialize, Default)]
struct TokenMetadata {
    name: Option<String>,
    symbol: Option<String>,
    decimals: Option<u8>,
}

#[derive(Deserialize)]
struct AssetTransfersResult {
    #[serde(default)]
    transfers: Vec<RawTransfer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransfer {
    hash: String,
    block_num: String,
    to: Option<String>,
    asset: Option<String>,
    category: Option<String>,
    erc721_token_id: Option<String>,
    erc1155_metadata: Option<Vec<Erc1155Item>>,
    raw_contract: Option<RawContract>,
    metadata: Option<TransferMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Erc1155Item {
    token_id: Option<String>,
}

#[derive(Deserialize)]
struct RawContract {
    address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferMetadata {
    block_timestamp: Option<String>,
}
