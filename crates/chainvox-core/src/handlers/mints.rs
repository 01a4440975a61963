//! ============================================================================
//! Recent Mints Handler
//! ============================================================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::chain::ChainDataProvider;
use crate::config::DEFAULT_MINT_LIMIT;
use crate::llm::LanguageModel;
use crate::prompt;
use crate::session::ConversationContext;

use super::assemble_messages;

pub struct RecentMintsHandler {
    chain: Arc<dyn ChainDataProvider>,
    model: Arc<dyn LanguageModel>,
    limit: u32,
}

impl RecentMintsHandler {
    pub fn new(chain: Arc<dyn ChainDataProvider>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            chain,
            model,
            limit: DEFAULT_MINT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub async fn handle(&self, utterance: &str, context: &ConversationContext) -> String {
        info!("Fetching {} most recent mints", self.limit);

        let events = match self.chain.get_recent_mints(self.limit).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Recent mints lookup failed: {}", e);
                return prompt::mints_error_reply(&e);
            }
        };

        let messages = assemble_messages(None, context, prompt::build_mints_prompt(utterance, &events));

        match self.model.complete(&messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Model failed to summarize {} mints: {}", events.len(), e);
                prompt::mints_fallback(&events)
            }
        }
    }
}
