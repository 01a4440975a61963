//! ============================================================================
//! Chain Module - Typed Façade Over the Base Network Read API
//! ============================================================================
//! Handlers depend on the `ChainDataProvider` trait only, so tests and
//! alternative providers can stand in for the Alchemy client.
//! ============================================================================

mod alchemy;
mod rpc;
pub mod units;

use async_trait::async_trait;

use crate::types::{ChainError, NftMintEvent, WalletAnalysis};

pub use alchemy::{AlchemyClient, ZERO_ADDRESS};
pub use rpc::JsonRpcTransport;

/// Read-only chain data source
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Balance, token holdings, nonce and contract flag for one address.
    /// Fails with `InvalidAddress` before any network call for malformed input.
    async fn get_wallet_analysis(&self, address: &str) -> Result<WalletAnalysis, ChainError>;

    /// Most recent NFT mints, newest first
    async fn get_recent_mints(&self, limit: u32) -> Result<Vec<NftMintEvent>, ChainError> {
        self.get_recent_mints_for(limit, None).await
    }

    /// Most recent NFT mints, optionally restricted to one collection contract
    async fn get_recent_mints_for(
        &self,
        limit: u32,
        collection: Option<&str>,
    ) -> Result<Vec<NftMintEvent>, ChainError>;

    /// Current gas price, e.g. "0.25 Gwei"
    async fn get_gas_price(&self) -> Result<String, ChainError>;

    /// Latest block number as a decimal string
    async fn get_latest_block(&self) -> Result<String, ChainError>;
}
