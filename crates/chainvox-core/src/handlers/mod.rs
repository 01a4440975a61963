//! ============================================================================
//! Handlers Module - One Responder per Intent
//! ============================================================================
//! Each handler turns an utterance plus conversation context into reply text:
//! - WalletAnalysisHandler: chain facts for one address, phrased by the model
//! - RecentMintsHandler: latest NFT mints on Base, summarized by the model
//! - GeneralQueryHandler: the model alone, scoped to concepts
//! Chain and model failures become user-facing text here and go no further.
//! ============================================================================

mod general;
mod mints;
mod wallet;

pub use general::GeneralQueryHandler;
pub use mints::RecentMintsHandler;
pub use wallet::WalletAnalysisHandler;

use crate::prompt::SYSTEM_PROMPT;
use crate::session::{ChatTurn, ConversationContext};

/// System prompt, then prior turns in order, then the current user turn
pub(crate) fn assemble_messages(
    extra_system: Option<&str>,
    context: &ConversationContext,
    user_turn: String,
) -> Vec<ChatTurn> {
    let mut messages = Vec::with_capacity(context.len() + 3);
    messages.push(ChatTurn::system(SYSTEM_PROMPT));
    if let Some(extra) = extra_system {
        messages.push(ChatTurn::system(extra));
    }
    messages.extend(context.turns().iter().cloned());
    messages.push(ChatTurn::user(user_turn));
    messages
}
