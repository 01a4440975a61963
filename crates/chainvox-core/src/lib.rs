//! ============================================================================
//! ChainVox Core - Voice-Driven Base Network Assistant
//! ============================================================================
//! Turns spoken or typed questions into answers about the Base network:
//! - Transcript accumulation and intent classification
//! - Typed JSON-RPC reads against an Alchemy-style provider
//! - Chat-completion phrasing of chain facts
//! - A hands-free voice session state machine over pluggable engines
//!
//! Frontends (CLI, desktop shell) own the conversation session and the
//! audio engines; this crate owns everything in between.
//! ============================================================================

pub mod chain;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod intent;
pub mod llm;
pub mod prompt;
pub mod retry;
pub mod session;
pub mod transcript;
pub mod types;
pub mod voice;

#[cfg(test)]
mod testing;

// Re-export the main API surface
pub use chain::{AlchemyClient, ChainDataProvider};
pub use config::{AppConfig, ChainConfig, ChainNetwork, ListeningMode, ModelConfig, VoiceConfig};
pub use dispatcher::QueryDispatcher;
pub use llm::{LanguageModel, OpenAiClient};
pub use retry::RetryConfig;
pub use session::{ChatTurn, ConversationContext, ConversationSession, Role};
pub use transcript::{TranscriptAccumulator, TranscriptFragment};
pub use types::*;
pub use voice::{
    SpeechToTextEngine, TextToSpeechEngine, VoiceEngines, VoiceEvent, VoiceNotice,
    VoiceSessionController, WakeWordEngine,
};
