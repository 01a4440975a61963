//! ============================================================================
//! Intent Classifier - Deterministic Utterance Routing
//! ============================================================================
//! Ordered rule set, first match wins:
//! 1. An embedded EVM address (0x + exactly 40 hex digits) -> WalletAnalysis
//! 2. A recent-mints keyword                              -> RecentMints
//! 3. Anything else                                       -> GeneralQuery
//!
//! The address rule is the most specific signal, so it wins even when the
//! utterance also mentions mints.
//! ============================================================================

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Intent;

/// Candidate addresses; the trailing-digit check below rejects runs of 41+ hex
static ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0[xX][0-9a-fA-F]{40}").expect("address pattern is valid"));

/// Phrases that route to the recent-mints handler (matched lower-cased)
pub const RECENT_MINT_KEYWORDS: &[&str] = &[
    "recent mints",
    "latest mints",
    "newly minted",
    "minting activity",
    "recently minted",
    "new mints",
    "recent nft mints",
    "latest nft mints",
];

/// Classify an utterance. Total and pure: never fails, never does I/O.
pub fn classify(utterance: &str) -> Intent {
    if let Some(address) = find_address(utterance) {
        return Intent::WalletAnalysis {
            address: address.to_string(),
        };
    }

    let normalized = utterance.trim().to_lowercase();
    if RECENT_MINT_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
    {
        return Intent::RecentMints;
    }

    Intent::GeneralQuery {
        text: utterance.trim().to_string(),
    }
}

/// First embedded address, returned exactly as written
pub fn find_address(text: &str) -> Option<&str> {
    ADDRESS_PATTERN.find_iter(text).find_map(|m| {
        let followed_by_hex = text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_hexdigit());
        (!followed_by_hex).then_some(m.as_str())
    })
}

/// Whether the whole string is a well-formed address
pub fn is_valid_address(address: &str) -> bool {
    let Some(digits) = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
    else {
        return false;
    };
    digits.len() == 40 && hex::decode(digits).is_ok()
}

/// Well-formed address rewritten with the lowercase `0x` prefix JSON-RPC nodes expect
pub fn rpc_address(address: &str) -> Option<String> {
    is_valid_address(address).then(|| format!("0x{}", &address[2..]))
}
