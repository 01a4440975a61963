//! ============================================================================
//! Transcript Accumulator - Speech Fragments to Committed Utterances
//! ============================================================================
//! Pure string state machine fed by the speech-to-text engine:
//! - Partial fragments grow the live (pending) buffer
//! - Endpoint fragments fold the pending buffer into the finalized transcript
//! - An explicit commit (user stop) finalizes whatever is pending
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::types::Utterance;

/// A piece of recognized speech emitted by the STT engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    /// Endpoint signal: the current segment is complete
    pub is_final: bool,
}

impl TranscriptFragment {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn endpoint(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Accumulates fragments for one listening session
#[derive(Debug, Default, Clone)]
pub struct TranscriptAccumulator {
    finalized: String,
    pending: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Returns the live transcript for display.
    pub fn feed(&mut self, fragment: &TranscriptFragment) -> String {
        self.pending.push_str(&fragment.text);
        if fragment.is_final {
            self.finalize_pending();
        }
        self.live()
    }

    /// Finalize the pending buffer without an endpoint signal.
    /// Returns the finalized transcript.
    pub fn commit(&mut self) -> &str {
        self.finalize_pending();
        &self.finalized
    }

    /// Clear both buffers for a new listening session
    pub fn reset(&mut self) {
        self.finalized.clear();
        self.pending.clear();
    }

    /// Finalized segments only; this is what gets dispatched
    pub fn finalized(&self) -> &str {
        &self.finalized
    }

    /// Display text: finalized segments, then ", " and the pending segment
    pub fn live(&self) -> String {
        let pending = self.pending.trim();
        match (self.finalized.is_empty(), pending.is_empty()) {
            (true, _) => pending.to_string(),
            (false, true) => self.finalized.clone(),
            (false, false) => format!("{}, {}", self.finalized, pending),
        }
    }

    /// Commit and hand out the utterance, leaving the accumulator empty.
    /// Blank transcripts yield `None` and are discarded.
    pub fn take_utterance(&mut self) -> Option<Utterance> {
        self.finalize_pending();
        let utterance = Utterance::new(&self.finalized);
        self.reset();
        utterance
    }

    fn finalize_pending(&mut self) {
        let segment = self.pending.trim();
        if !segment.is_empty() {
            if self.finalized.is_empty() {
                self.finalized = segment.to_string();
            } else {
                self.finalized = format!("{} {}", self.finalized, segment);
            }
        }
        self.finalized = self.finalized.trim().to_string();
        self.pending.clear();
    }
}
