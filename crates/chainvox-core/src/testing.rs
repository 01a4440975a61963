//! ============================================================================
//! Test Doubles - In-Memory Chain and Model Backends
//! ============================================================================

use async_trait::async_trait;
use std::sync::Mutex;

use crate::chain::ChainDataProvider;
use crate::llm::LanguageModel;
use crate::session::ChatTurn;
use crate::types::{ChainError, LmError, NftMintEvent, WalletAnalysis};

/// Chain provider returning an empty wallet and no mints, or a fixed error
#[derive(Default)]
pub struct FakeChain {
    error: Option<ChainError>,
    mints: Vec<NftMintEvent>,
    wallet_calls: Mutex<Vec<String>>,
    mint_limits: Mutex<Vec<u32>>,
}

impl FakeChain {
    pub fn failing(error: ChainError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn with_mints(mints: Vec<NftMintEvent>) -> Self {
        Self {
            mints,
            ..Default::default()
        }
    }

    pub fn wallet_calls(&self) -> Vec<String> {
        self.wallet_calls.lock().unwrap().clone()
    }

    pub fn mint_limits(&self) -> Vec<u32> {
        self.mint_limits.lock().unwrap().clone()
    }

    pub fn mint_calls(&self) -> usize {
        self.mint_limits.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainDataProvider for FakeChain {
    async fn get_wallet_analysis(&self, address: &str) -> Result<WalletAnalysis, ChainError> {
        self.wallet_calls.lock().unwrap().push(address.to_string());
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        Ok(WalletAnalysis {
            address: address.to_string(),
            eth_balance: "0".to_string(),
            token_balances: Vec::new(),
            transaction_count: 0,
            is_contract: false,
        })
    }

    async fn get_recent_mints_for(
        &self,
        limit: u32,
        _collection: Option<&str>,
    ) -> Result<Vec<NftMintEvent>, ChainError> {
        self.mint_limits.lock().unwrap().push(limit);
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.mints.iter().take(limit as usize).cloned().collect()),
        }
    }

    async fn get_gas_price(&self) -> Result<String, ChainError> {
        Ok("0.01 Gwei".to_string())
    }

    async fn get_latest_block(&self) -> Result<String, ChainError> {
        Ok("1".to_string())
    }
}

/// Model returning a fixed reply (or error) and recording what it was sent
pub struct ScriptedModel {
    reply: Result<String, LmError>,
    calls: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: LmError) -> Self {
        Self {
            reply: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_messages(&self) -> Vec<ChatTurn> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, LmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.reply.clone()
    }
}
