//! ============================================================================
//! Voice Session Controller - Hands-Free Listening State Machine
//! ============================================================================
//! Consumes `VoiceEvent`s one at a time and drives the engines:
//!
//!   Idle -> ArmedForWakeWord -> ListeningForUtterance -> Dispatching -> Speaking
//!                ^                                                        |
//!                +----------------- settle delay -------------------------+
//!
//! Guards:
//! - wake-word spotting and speech-to-text never hold the microphone together
//! - engine failures disable the capability and are reported once
//! - events arriving mid-dispatch are ignored, except Disable which is
//!   honoured once the reply is ready
//! ============================================================================

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::{ListeningMode, VoiceConfig};
use crate::dispatcher::QueryDispatcher;
use crate::prompt;
use crate::session::ConversationSession;
use crate::transcript::{TranscriptAccumulator, TranscriptFragment};
use crate::types::{Utterance, VoiceCapability, VoiceEngineError, VoiceSessionState};

use super::{SpeechToTextEngine, TextToSpeechEngine, VoiceEvent, VoiceNotice, WakeWordEngine};

/// Engines available to the controller; any may be absent
#[derive(Default)]
pub struct VoiceEngines {
    pub wake_word: Option<Box<dyn WakeWordEngine>>,
    pub speech_to_text: Option<Box<dyn SpeechToTextEngine>>,
    pub text_to_speech: Option<Box<dyn TextToSpeechEngine>>,
}

pub struct VoiceSessionController {
    state: VoiceSessionState,
    config: VoiceConfig,
    engines: VoiceEngines,

    // Guard flags
    voice_enabled: bool,
    wake_loaded: bool,
    stt_loaded: bool,
    wake_active: bool,
    stt_active: bool,
    tts_failed: bool,

    accumulator: TranscriptAccumulator,
    dispatcher: Arc<QueryDispatcher>,
    session: Arc<RwLock<ConversationSession>>,
    /// Capabilities already reported since voice was last enabled
    reported: HashSet<VoiceCapability>,

    events: mpsc::UnboundedReceiver<VoiceEvent>,
    notices: mpsc::UnboundedSender<VoiceNotice>,
    events_closed: bool,
}

impl VoiceSessionController {
    pub fn new(
        config: VoiceConfig,
        engines: VoiceEngines,
        dispatcher: Arc<QueryDispatcher>,
        session: Arc<RwLock<ConversationSession>>,
        events: mpsc::UnboundedReceiver<VoiceEvent>,
        notices: mpsc::UnboundedSender<VoiceNotice>,
    ) -> Self {
        Self {
            state: VoiceSessionState::Idle,
            config,
            engines,
            voice_enabled: false,
            wake_loaded: false,
            stt_loaded: false,
            wake_active: false,
            stt_active: false,
            tts_failed: false,
            accumulator: TranscriptAccumulator::new(),
            dispatcher,
            session,
            reported: HashSet::new(),
            events,
            notices,
            events_closed: false,
        }
    }

    pub fn state(&self) -> VoiceSessionState {
        self.state
    }

    pub fn is_voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    /// Live transcript of the utterance being captured
    pub fn live_transcript(&self) -> String {
        self.accumulator.live()
    }

    /// Process events until the channel closes, then tear down
    pub async fn run(mut self) {
        info!("Voice session controller started (mode {:?})", self.config.mode);

        if self.config.enabled {
            self.enable().await;
        }

        while !self.events_closed {
            match self.events.recv().await {
                Some(event) => self.handle_event(event).await,
                None => self.events_closed = true,
            }
        }

        self.teardown().await;
        info!("Voice session controller stopped");
    }

    /// Apply one event to the state machine
    pub async fn handle_event(&mut self, event: VoiceEvent) {
        debug!("Voice event {:?} in state {:?}", event, self.state);

        match event {
            VoiceEvent::Enable => self.enable().await,
            VoiceEvent::Disable => self.teardown().await,
            VoiceEvent::WakeWordDetected(label) => self.on_wake_word(&label).await,
            VoiceEvent::SttFragment(fragment) => self.on_fragment(fragment).await,
            VoiceEvent::SttEnded => {
                self.stt_active = false;
                if self.state == VoiceSessionState::ListeningForUtterance {
                    self.finish_utterance().await;
                }
            }
            VoiceEvent::StopRequested => {
                if self.state == VoiceSessionState::ListeningForUtterance {
                    self.finish_utterance().await;
                }
            }
            VoiceEvent::SttError(e) => {
                if !self.stt_active && self.state != VoiceSessionState::ListeningForUtterance {
                    debug!("Ignoring speech-to-text error after stop: {}", e);
                    return;
                }
                self.stt_active = false;
                self.report(VoiceCapability::SpeechToText, e);
                self.teardown().await;
            }
            VoiceEvent::TtsStarted => debug!("Speech playback started"),
            VoiceEvent::TtsFinished => {
                if self.state == VoiceSessionState::Speaking {
                    sleep(self.config.settle_delay()).await;
                    self.rearm().await;
                }
            }
            VoiceEvent::TtsError(e) => {
                if self.state != VoiceSessionState::Speaking {
                    debug!("Ignoring text-to-speech error in state {:?}: {}", self.state, e);
                    return;
                }
                self.tts_failed = true;
                self.report(VoiceCapability::TextToSpeech, e);
                self.rearm().await;
            }
        }
    }

    // ========================================================================
    // Enable / Disable
    // ========================================================================

    /// Load engines and start listening. Failures disable voice mode again.
    pub async fn enable(&mut self) {
        if self.voice_enabled {
            debug!("Voice mode already enabled");
            return;
        }

        info!("Enabling voice mode");
        self.voice_enabled = true;
        self.reported.clear();
        self.tts_failed = false;

        if let Err((capability, e)) = self.load_engines().await {
            self.report(capability, e);
            self.teardown().await;
            return;
        }

        match self.config.mode {
            ListeningMode::WakeWord => self.arm_wake_word().await,
            ListeningMode::Continuous => self.begin_listening().await,
        }
    }

    async fn load_engines(&mut self) -> Result<(), (VoiceCapability, VoiceEngineError)> {
        if self.config.mode == ListeningMode::WakeWord && !self.wake_loaded {
            let engine = self.engines.wake_word.as_mut().ok_or((
                VoiceCapability::WakeWord,
                VoiceEngineError::LoadFailed("no wake-word engine configured".to_string()),
            ))?;
            engine
                .init(&self.config.wake_word_model_paths)
                .await
                .map_err(|e| (VoiceCapability::WakeWord, e))?;
            self.wake_loaded = true;
            info!("Wake-word engine loaded ({})", self.config.wake_word_label);
        }

        if !self.stt_loaded {
            let engine = self.engines.speech_to_text.as_mut().ok_or((
                VoiceCapability::SpeechToText,
                VoiceEngineError::LoadFailed("no speech-to-text engine configured".to_string()),
            ))?;
            engine.init().await.map_err(|e| (VoiceCapability::SpeechToText, e))?;
            self.stt_loaded = true;
            info!("Speech-to-text engine loaded");
        }

        if self.engines.text_to_speech.is_none() {
            warn!("No text-to-speech engine; replies will be text only");
        }
        Ok(())
    }

    /// Stop and release everything, return to Idle
    pub async fn teardown(&mut self) {
        if self.voice_enabled {
            info!("Disabling voice mode");
        }
        self.voice_enabled = false;

        self.stop_wake_word().await;
        self.stop_speech_to_text().await;
        if self.state == VoiceSessionState::Speaking {
            if let Some(tts) = self.engines.text_to_speech.as_mut() {
                tts.stop().await;
            }
        }

        if self.wake_loaded {
            if let Some(engine) = self.engines.wake_word.as_mut() {
                engine.release().await;
            }
            self.wake_loaded = false;
        }
        if self.stt_loaded {
            if let Some(engine) = self.engines.speech_to_text.as_mut() {
                engine.release().await;
            }
            self.stt_loaded = false;
        }

        self.accumulator.reset();
        self.set_state(VoiceSessionState::Idle);
    }

    // ========================================================================
    // Listening
    // ========================================================================

    async fn arm_wake_word(&mut self) {
        self.stop_speech_to_text().await;
        debug_assert!(!self.stt_active, "speech-to-text still holds the microphone");

        let Some(engine) = self.engines.wake_word.as_mut() else {
            self.teardown().await;
            return;
        };

        if !self.wake_active {
            if let Err(e) = engine.start().await {
                self.report(VoiceCapability::WakeWord, e);
                self.teardown().await;
                return;
            }
            self.wake_active = true;
        }
        self.set_state(VoiceSessionState::ArmedForWakeWord);
    }

    async fn on_wake_word(&mut self, label: &str) {
        if self.state != VoiceSessionState::ArmedForWakeWord {
            debug!("Ignoring wake word '{}' in state {:?}", label, self.state);
            return;
        }
        info!("Wake word detected: {}", label);
        self.begin_listening().await;
    }

    async fn begin_listening(&mut self) {
        // The wake-word engine always releases the microphone first
        self.stop_wake_word().await;
        debug_assert!(!self.wake_active, "wake-word engine still holds the microphone");

        self.accumulator.reset();

        let Some(engine) = self.engines.speech_to_text.as_mut() else {
            self.teardown().await;
            return;
        };

        if !self.stt_active {
            if let Err(e) = engine.start().await {
                self.report(VoiceCapability::SpeechToText, e);
                self.teardown().await;
                return;
            }
            self.stt_active = true;
        }
        self.set_state(VoiceSessionState::ListeningForUtterance);
    }

    async fn on_fragment(&mut self, fragment: TranscriptFragment) {
        if self.state != VoiceSessionState::ListeningForUtterance {
            debug!("Ignoring transcript fragment in state {:?}", self.state);
            return;
        }

        let live = self.accumulator.feed(&fragment);
        self.notify(VoiceNotice::Transcript { text: live });

        if fragment.is_final {
            self.finish_utterance().await;
        }
    }

    /// Stop recognition and dispatch whatever was committed
    async fn finish_utterance(&mut self) {
        self.stop_speech_to_text().await;

        match self.accumulator.take_utterance() {
            Some(utterance) => self.dispatch(utterance).await,
            None => {
                debug!("Empty transcript, listening again");
                self.rearm().await;
            }
        }
    }

    /// Back to listening for the next question, per mode
    async fn rearm(&mut self) {
        if !self.voice_enabled {
            self.teardown().await;
            return;
        }
        match self.config.mode {
            ListeningMode::WakeWord => self.arm_wake_word().await,
            ListeningMode::Continuous => self.begin_listening().await,
        }
    }

    // ========================================================================
    // Dispatch & Speech
    // ========================================================================

    async fn dispatch(&mut self, utterance: Utterance) {
        self.set_state(VoiceSessionState::Dispatching);
        info!("Dispatching utterance: {}", utterance.text());

        let question = utterance.text().to_string();
        let context = self.session.read().await.context();
        let dispatcher = self.dispatcher.clone();
        let limit = self.config.dispatch_timeout();

        let mut disable_requested = false;
        let reply = {
            let work = async {
                match timeout(limit, dispatcher.dispatch(&question, &context)).await {
                    Ok(reply) => reply,
                    Err(_) => {
                        warn!("Dispatch exceeded {:?}", limit);
                        prompt::dispatch_timeout_reply(&question)
                    }
                }
            };
            tokio::pin!(work);

            loop {
                tokio::select! {
                    reply = &mut work => break reply,
                    event = self.events.recv(), if !self.events_closed => match event {
                        Some(VoiceEvent::Disable) => {
                            info!("Disable requested during dispatch; honouring after reply");
                            disable_requested = true;
                        }
                        Some(other) => debug!("Ignoring {:?} while dispatching", other),
                        None => self.events_closed = true,
                    },
                }
            }
        };

        self.session.write().await.record_exchange(&question, &reply);
        self.notify(VoiceNotice::Response {
            utterance: question,
            reply: reply.clone(),
        });

        if disable_requested {
            self.voice_enabled = false;
        }
        if !self.voice_enabled {
            self.teardown().await;
            return;
        }

        if self.tts_failed {
            self.rearm().await;
            return;
        }

        let Some(tts) = self.engines.text_to_speech.as_mut() else {
            self.rearm().await;
            return;
        };

        match tts.speak(&reply, &self.config.tts_lang).await {
            Ok(()) => self.set_state(VoiceSessionState::Speaking),
            Err(e) => {
                self.tts_failed = true;
                self.report(VoiceCapability::TextToSpeech, e);
                self.rearm().await;
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn stop_wake_word(&mut self) {
        if self.wake_active {
            if let Some(engine) = self.engines.wake_word.as_mut() {
                engine.stop().await;
            }
            self.wake_active = false;
        }
    }

    async fn stop_speech_to_text(&mut self) {
        if self.stt_active {
            if let Some(engine) = self.engines.speech_to_text.as_mut() {
                engine.stop().await;
            }
            self.stt_active = false;
        }
    }

    fn set_state(&mut self, state: VoiceSessionState) {
        if self.state != state {
            debug!("Voice state {:?} -> {:?}", self.state, state);
            self.state = state;
            self.notify(VoiceNotice::StateChanged { state });
        }
    }

    /// Surface an engine failure once per capability
    fn report(&mut self, capability: VoiceCapability, error: VoiceEngineError) {
        if !self.reported.insert(capability) {
            debug!("Suppressing repeated {} failure: {}", capability, error);
            return;
        }
        error!("Voice capability {} failed: {}", capability, error);
        self.notify(VoiceNotice::CapabilityFailed { capability, error });
    }

    fn notify(&self, notice: VoiceNotice) {
        // The UI side may have gone away
        let _ = self.notices.send(notice);
    }
}
