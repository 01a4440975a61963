//! ============================================================================
//! General Query Handler
//! ============================================================================

use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::LanguageModel;
use crate::prompt::{self, GENERAL_SCOPE_PROMPT};
use crate::session::ConversationContext;

use super::assemble_messages;

pub struct GeneralQueryHandler {
    model: Arc<dyn LanguageModel>,
}

impl GeneralQueryHandler {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn handle(&self, utterance: &str, context: &ConversationContext) -> String {
        debug!("General query: {}", utterance);

        let messages = assemble_messages(Some(GENERAL_SCOPE_PROMPT), context, utterance.to_string());

        match self.model.complete(&messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Model failed on general query: {}", e);
                prompt::general_error_reply(utterance, &e)
            }
        }
    }
}
