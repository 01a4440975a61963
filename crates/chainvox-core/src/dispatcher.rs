//! ============================================================================
//! Query Dispatcher - Classify Once, Answer Once
//! ============================================================================
//! Routes every utterance to exactly one handler. Holds no state between
//! calls: conversation history is owned by the caller and passed in.
//! ============================================================================

use std::sync::Arc;
use tracing::info;

use crate::chain::ChainDataProvider;
use crate::handlers::{GeneralQueryHandler, RecentMintsHandler, WalletAnalysisHandler};
use crate::intent;
use crate::llm::LanguageModel;
use crate::session::ConversationContext;
use crate::types::Intent;

pub struct QueryDispatcher {
    wallet: WalletAnalysisHandler,
    mints: RecentMintsHandler,
    general: GeneralQueryHandler,
}

impl QueryDispatcher {
    pub fn new(chain: Arc<dyn ChainDataProvider>, model: Arc<dyn LanguageModel>, mint_limit: u32) -> Self {
        Self {
            wallet: WalletAnalysisHandler::new(chain.clone(), model.clone()),
            mints: RecentMintsHandler::new(chain, model.clone()).with_limit(mint_limit),
            general: GeneralQueryHandler::new(model),
        }
    }

    /// Answer one utterance. Always yields text; failures are already phrased.
    pub async fn dispatch(&self, utterance: &str, context: &ConversationContext) -> String {
        let intent = intent::classify(utterance);
        info!("Dispatching {} query", intent.label());

        match intent {
            Intent::WalletAnalysis { address } => self.wallet.handle(utterance, &address, context).await,
            Intent::RecentMints => self.mints.handle(utterance, context).await,
            Intent::GeneralQuery { text } => self.general.handle(&text, context).await,
        }
    }
}
