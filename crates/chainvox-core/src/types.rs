//! ============================================================================
//! Core Types for ChainVox
//! ============================================================================
//! Defines the data structures shared by the classifier, the chain client,
//! the intent handlers and the voice session controller.
//! These types are serializable so a frontend can render them directly.
//! ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker rendered in prompts and summaries when token metadata is absent
pub const MISSING_MARKER: &str = "[missing]";

// ============================================================================
// Utterances & Intents
// ============================================================================

/// A committed user utterance, ready for dispatch.
/// Never empty after trimming; construction fails for blank text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    text: String,
    committed_at: DateTime<Utc>,
}

impl Utterance {
    /// Build an utterance from raw text, discarding blank input
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            text: trimmed.to_string(),
            committed_at: Utc::now(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }
}

/// Classified purpose of an utterance
/// Example: "what's in 0xabc...?" -> WalletAnalysis { address: "0xabc..." }
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Inspect a single wallet or contract address
    WalletAnalysis { address: String },
    /// Summarize the latest NFT mint transfers
    RecentMints,
    /// Open-ended question answered by the language model alone
    GeneralQuery { text: String },
}

impl Intent {
    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Intent::WalletAnalysis { .. } => "wallet_analysis",
            Intent::RecentMints => "recent_mints",
            Intent::GeneralQuery { .. } => "general_query",
        }
    }
}

// ============================================================================
// Chain Data Records
// ============================================================================

/// Snapshot of a wallet's on-chain state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAnalysis {
    pub address: String,
    /// ETH balance as a decimal string (e.g. "0.25")
    pub eth_balance: String,
    pub token_balances: Vec<TokenBalance>,
    pub transaction_count: u64,
    pub is_contract: bool,
}

impl WalletAnalysis {
    /// True when the address shows no balance, no tokens and no outgoing transactions
    pub fn looks_inactive(&self) -> bool {
        self.transaction_count == 0
            && self.token_balances.is_empty()
            && is_zero_decimal(&self.eth_balance)
    }
}

fn is_zero_decimal(value: &str) -> bool {
    value.chars().all(|c| c == '0' || c == '.') && !value.is_empty()
}

/// A single ERC-20 holding. Absent metadata is kept as `None`, never guessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub contract_address: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: Option<u8>,
    /// Balance in display units when decimals are known, raw units otherwise
    pub amount: String,
}

impl TokenBalance {
    /// Symbol or the explicit missing marker
    pub fn symbol_or_marker(&self) -> &str {
        self.symbol.as_deref().unwrap_or(MISSING_MARKER)
    }

    /// Name or the explicit missing marker
    pub fn name_or_marker(&self) -> &str {
        self.name.as_deref().unwrap_or(MISSING_MARKER)
    }
}

/// Token standard of a minted asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStandard {
    Erc721,
    Erc1155,
    Unknown,
}

impl TokenStandard {
    pub fn from_category(category: &str) -> Self {
        match category.to_lowercase().as_str() {
            "erc721" => TokenStandard::Erc721,
            "erc1155" => TokenStandard::Erc1155,
            _ => TokenStandard::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStandard::Erc721 => "ERC-721",
            TokenStandard::Erc1155 => "ERC-1155",
            TokenStandard::Unknown => "unknown standard",
        }
    }
}

/// An NFT transfer whose sender is the zero address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftMintEvent {
    pub tx_hash: String,
    /// Block number as a decimal string
    pub block_number: String,
    pub timestamp: Option<String>,
    pub contract_address: Option<String>,
    pub token_id: Option<String>,
    pub minter_address: String,
    pub collection_label: Option<String>,
    pub token_standard: TokenStandard,
}

// ============================================================================
// Voice Session State
// ============================================================================

/// Voice session state. Exactly one is active per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceSessionState {
    Idle,
    ArmedForWakeWord,
    ListeningForUtterance,
    Dispatching,
    Speaking,
}

/// Optional voice capabilities that can fail independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceCapability {
    WakeWord,
    SpeechToText,
    TextToSpeech,
}

impl std::fmt::Display for VoiceCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VoiceCapability::WakeWord => "wake word",
            VoiceCapability::SpeechToText => "speech-to-text",
            VoiceCapability::TextToSpeech => "text-to-speech",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Failures surfaced by the chain data client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Chain data network failure: {0}")]
    NetworkFailure(String),

    #[error("Chain data provider rate limited the request")]
    RateLimited,

    #[error("Malformed chain data response: {0}")]
    Malformed(String),
}

/// Failures surfaced by the language model client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LmError {
    #[error("Language model unavailable: {0}")]
    Unavailable(String),

    #[error("Language model rate limited the request")]
    RateLimited,

    #[error("Malformed language model response: {0}")]
    MalformedResponse(String),
}

/// Failures surfaced by wake-word, speech-to-text and text-to-speech engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VoiceEngineError {
    #[error("Engine failed to load: {0}")]
    LoadFailed(String),

    #[error("Engine failed to start: {0}")]
    StartFailed(String),

    #[error("Microphone or audio permission denied")]
    PermissionDenied,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_utterance_is_discarded() {
        assert!(Utterance::new("   ").is_none());
        assert!(Utterance::new("").is_none());

        let utterance = Utterance::new("  hello  ").unwrap();
        assert_eq!(utterance.text(), "hello");
    }

    #[test]
    fn test_intent_serializes_with_kind_tag() {
        let json = serde_json::to_value(Intent::RecentMints).unwrap();
        assert_eq!(json["kind"], "recent_mints");

        let json = serde_json::to_value(Intent::WalletAnalysis {
            address: "0xabc".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "wallet_analysis");
        assert_eq!(json["address"], "0xabc");
    }

    #[test]
    fn test_missing_token_metadata_uses_marker() {
        let token = TokenBalance {
            contract_address: "0x1".into(),
            symbol: None,
            name: Some("Wrapped Ether".into()),
            decimals: None,
            amount: "5".into(),
        };
        assert_eq!(token.symbol_or_marker(), MISSING_MARKER);
        assert_eq!(token.name_or_marker(), "Wrapped Ether");
    }

    #[test]
    fn test_inactive_wallet_detection() {
        let mut wallet = WalletAnalysis {
            address: "0x0".into(),
            eth_balance: "0".into(),
            token_balances: vec![],
            transaction_count: 0,
            is_contract: false,
        };
        assert!(wallet.looks_inactive());

        wallet.eth_balance = "0.001".into();
        assert!(!wallet.looks_inactive());
    }

    #[test]
    fn test_token_standard_from_category() {
        assert_eq!(TokenStandard::from_category("erc721"), TokenStandard::Erc721);
        assert_eq!(TokenStandard::from_category("ERC1155"), TokenStandard::Erc1155);
        assert_eq!(TokenStandard::from_category("specialnft"), TokenStandard::Unknown);
    }
}
