//! ============================================================================
//! Voice Module - Engine Seams, Events and the Session Controller
//! ============================================================================
//! Wake-word, speech-to-text and text-to-speech engines are external; they
//! plug in through the traits below and report back by pushing `VoiceEvent`s
//! into the controller's channel. The controller publishes `VoiceNotice`s
//! (state, live transcript, replies, capability failures) for a UI.
//! ============================================================================

mod controller;

pub use controller::{VoiceEngines, VoiceSessionController};

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

use crate::transcript::TranscriptFragment;
use crate::types::{VoiceCapability, VoiceEngineError, VoiceSessionState};

// ============================================================================
// Engine Traits
// ============================================================================

/// Wake phrase spotter. Emits `VoiceEvent::WakeWordDetected` while started.
#[async_trait]
pub trait WakeWordEngine: Send {
    async fn init(&mut self, model_paths: &[PathBuf]) -> Result<(), VoiceEngineError>;
    async fn start(&mut self) -> Result<(), VoiceEngineError>;
    /// Idempotent: stopping a stopped engine is a no-op
    async fn stop(&mut self);
    async fn release(&mut self);
}

/// Streaming recognizer. Emits `SttFragment`, `SttEnded` and `SttError`.
#[async_trait]
pub trait SpeechToTextEngine: Send {
    async fn init(&mut self) -> Result<(), VoiceEngineError>;
    async fn start(&mut self) -> Result<(), VoiceEngineError>;
    /// Idempotent: stopping a stopped engine is a no-op
    async fn stop(&mut self);
    async fn release(&mut self);
}

/// Speech synthesizer. `speak` queues audio; completion arrives as `TtsFinished`.
#[async_trait]
pub trait TextToSpeechEngine: Send {
    async fn speak(&mut self, text: &str, lang: &str) -> Result<(), VoiceEngineError>;
    /// Cancel any speech in progress
    async fn stop(&mut self);
}

// ============================================================================
// Events & Notices
// ============================================================================

/// Input to the controller: engine callbacks and user controls
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    WakeWordDetected(String),
    SttFragment(TranscriptFragment),
    /// Recognizer stopped on its own
    SttEnded,
    SttError(VoiceEngineError),
    TtsStarted,
    TtsFinished,
    TtsError(VoiceEngineError),
    /// Manual stop of the current utterance
    StopRequested,
    Enable,
    Disable,
}

/// Output from the controller for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceNotice {
    StateChanged { state: VoiceSessionState },
    /// Finalized plus pending transcript while listening
    Transcript { text: String },
    Response { utterance: String, reply: String },
    CapabilityFailed { capability: VoiceCapability, error: VoiceEngineError },
}
