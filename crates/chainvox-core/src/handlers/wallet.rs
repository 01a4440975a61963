//! ============================================================================
//! Wallet Analysis Handler
//! ============================================================================
//! Fetches balance, token holdings, nonce and contract flag for the address,
//! hands the facts to the model and appends an inactivity note for empty
//! wallets. A chain failure short-circuits to a deterministic reply.
//! ============================================================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::chain::ChainDataProvider;
use crate::llm::LanguageModel;
use crate::prompt;
use crate::session::ConversationContext;

use super::assemble_messages;

pub struct WalletAnalysisHandler {
    chain: Arc<dyn ChainDataProvider>,
    model: Arc<dyn LanguageModel>,
}

impl WalletAnalysisHandler {
    pub fn new(chain: Arc<dyn ChainDataProvider>, model: Arc<dyn LanguageModel>) -> Self {
        Self { chain, model }
    }

    pub async fn handle(&self, utterance: &str, address: &str, context: &ConversationContext) -> String {
        info!("Analyzing wallet {}", address);

        let analysis = match self.chain.get_wallet_analysis(address).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Wallet lookup failed for {}: {}", address, e);
                return prompt::chain_error_reply(address, &e);
            }
        };

        let messages = assemble_messages(
            None,
            context,
            prompt::build_wallet_prompt(utterance, &analysis),
        );

        let mut reply = match self.model.complete(&messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Model failed to summarize wallet {}: {}", address, e);
                prompt::wallet_facts_fallback(&analysis, &e)
            }
        };

        if analysis.looks_inactive() {
            reply.push_str("\n\n");
            reply.push_str(&prompt::inactivity_note(&analysis.address));
        }
        reply
    }
}
