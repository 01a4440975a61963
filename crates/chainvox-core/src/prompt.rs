//! ============================================================================
//! Prompt Builders - Chain Facts to Model Input, Failures to Plain Text
//! ============================================================================
//! Everything here is deterministic string assembly:
//! - the persona system prompt shared by all handlers
//! - structured fact blocks for wallet and mint questions
//! - fallback replies used when the chain or the model cannot answer
//! ============================================================================

use crate::types::{ChainError, LmError, NftMintEvent, WalletAnalysis, MISSING_MARKER};

/// Persona shared by every handler
pub const SYSTEM_PROMPT: &str = "You are ChainVox, a voice assistant specialized in Base network \
blockchain data. You explain wallet holdings, NFT minting activity, gas and network concepts.\n\
Answers are read aloud, so keep them short and conversational: a few sentences, no tables, \
no markdown, no emojis.\n\
Only state on-chain facts that appear in the data you are given. \
When a value is marked [missing], say it is unknown rather than guessing.";

/// Scope rule for questions answered without chain data
pub const GENERAL_SCOPE_PROMPT: &str = "Answer general questions about blockchains, Ethereum, \
Base, tokens and NFTs from your own knowledge. You have no live network access in this mode: \
if the user asks for live aggregate statistics (current TVL, today's volume, number of mints \
right now, live prices), say you can't look those up and suggest asking about a specific \
wallet address or the latest mints instead.";

// ============================================================================
// Wallet Analysis
// ============================================================================

/// Fact block for one wallet, with explicit markers for absent metadata
pub fn build_wallet_prompt(question: &str, analysis: &WalletAnalysis) -> String {
    let mut prompt = format!(
        "The user asked: \"{}\"\n\n\
        On-chain data for {} on Base:\n\
        - Account type: {}\n\
        - ETH balance: {} ETH\n\
        - Outgoing transaction count: {}\n",
        question,
        analysis.address,
        if analysis.is_contract { "smart contract" } else { "externally owned wallet" },
        analysis.eth_balance,
        analysis.transaction_count,
    );

    if analysis.token_balances.is_empty() {
        prompt.push_str("- Token holdings: none\n");
    } else {
        prompt.push_str(&format!("- Token holdings ({}):\n", analysis.token_balances.len()));
        for token in &analysis.token_balances {
            prompt.push_str(&format!(
                "  * {} ({}): {} [contract {}]\n",
                token.name_or_marker(),
                token.symbol_or_marker(),
                token.amount,
                token.contract_address
            ));
        }
    }

    if analysis.looks_inactive() {
        prompt.push_str(
            "\nThis address has a zero balance, no tokens and no outgoing transactions. \
            It appears to be empty or inactive; say so plainly.\n",
        );
    }

    prompt.push_str("\nSummarize this wallet for the user in plain spoken language.");
    prompt
}

/// Spoken note appended for wallets with no activity
pub fn inactivity_note(address: &str) -> String {
    format!(
        "Note: {} has a zero ETH balance, zero transactions and no tokens. It may be inactive or not yet indexed.",
        address
    )
}

/// Deterministic summary used when the model can't phrase the wallet facts
pub fn wallet_facts_fallback(analysis: &WalletAnalysis, error: &LmError) -> String {
    let kind = if analysis.is_contract { "a smart contract" } else { "a wallet" };
    let mut text = format!(
        "{} is {} holding {} ETH with {} outgoing transactions",
        analysis.address, kind, analysis.eth_balance, analysis.transaction_count
    );

    match analysis.token_balances.len() {
        0 => text.push_str(" and no tokens."),
        n => {
            let symbols: Vec<&str> = analysis
                .token_balances
                .iter()
                .take(5)
                .map(|t| t.symbol_or_marker())
                .collect();
            text.push_str(&format!(" and {} tokens, including {}.", n, symbols.join(", ")));
        }
    }

    text.push_str(&format!(" I couldn't get a fuller analysis from the language model ({}).", error));
    text
}

/// Reply when the wallet facts could not be fetched
pub fn chain_error_reply(address: &str, error: &ChainError) -> String {
    let cause = match error {
        ChainError::InvalidAddress(_) => {
            "The address doesn't look valid. A Base address is 0x followed by 40 hexadecimal characters."
        }
        ChainError::RateLimited => "The data provider is rate limiting requests right now.",
        ChainError::NetworkFailure(_) => "I couldn't reach the data provider.",
        ChainError::Malformed(_) => "The data provider returned a response I couldn't read.",
    };

    format!(
        "Sorry, I couldn't analyze {}. {}\n\
        Likely causes:\n\
        - the address format is wrong\n\
        - a network connectivity problem\n\
        - the data provider's rate limit was reached\n\
        - the address isn't indexed on Base yet\n\
        Please check the address and try again in a moment.",
        address, cause
    )
}

// ============================================================================
// Recent Mints
// ============================================================================

/// Compact single-line rendering of one mint
pub fn mint_line(event: &NftMintEvent) -> String {
    let collection = event
        .collection_label
        .as_deref()
        .or(event.contract_address.as_deref())
        .unwrap_or(MISSING_MARKER);

    let mut line = format!(
        "{} token {} minted to {} in block {} (tx {})",
        collection,
        event.token_id.as_deref().unwrap_or(MISSING_MARKER),
        event.minter_address,
        event.block_number,
        event.tx_hash
    );
    line.push_str(&format!(", {}", event.token_standard.as_str()));
    if let Some(timestamp) = &event.timestamp {
        line.push_str(&format!(", at {}", timestamp));
    }
    line
}

/// Mint list prompt. An empty list is stated explicitly.
pub fn build_mints_prompt(question: &str, events: &[NftMintEvent]) -> String {
    let mut prompt = format!("The user asked: \"{}\"\n\n", question);

    if events.is_empty() {
        prompt.push_str(
            "No recent mints were found on Base for this query. \
            Tell the user that clearly and don't invent any collections.",
        );
        return prompt;
    }

    prompt.push_str(&format!("The {} most recent NFT mints on Base, newest first:\n", events.len()));
    for (i, event) in events.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, mint_line(event)));
    }
    prompt.push_str("\nSummarize this minting activity for the user, mentioning notable collections.");
    prompt
}

/// Reply when mint data could not be fetched
pub fn mints_error_reply(error: &ChainError) -> String {
    let cause = match error {
        ChainError::RateLimited => "the data provider is rate limiting requests",
        ChainError::NetworkFailure(_) => "I couldn't reach the data provider",
        ChainError::Malformed(_) => "the data provider returned a response I couldn't read",
        ChainError::InvalidAddress(_) => "the collection address isn't valid",
    };
    format!("Sorry, I couldn't fetch recent mints because {}. Please try again in a moment.", cause)
}

/// Deterministic mint summary used when the model is unavailable
pub fn mints_fallback(events: &[NftMintEvent]) -> String {
    if events.is_empty() {
        return "No recent mints were found on Base.".to_string();
    }
    let lines: Vec<String> = events.iter().map(mint_line).collect();
    let heading = match events.len() {
        1 => "Here is the latest mint on Base.".to_string(),
        n => format!("Here are the {} latest mints on Base.", n),
    };
    format!("{} {}.", heading, lines.join(". "))
}

// ============================================================================
// General Queries
// ============================================================================

/// Reply when the model can't answer an open question
pub fn general_error_reply(question: &str, error: &LmError) -> String {
    let cause = match error {
        LmError::RateLimited => "it is rate limiting requests right now",
        LmError::Unavailable(_) => "it is unavailable",
        LmError::MalformedResponse(_) => "its response couldn't be read",
    };
    format!(
        "Sorry, I couldn't reach the language model to answer \"{}\" because {}. Please try again shortly.",
        question, cause
    )
}

/// Reply when a spoken question took longer than the dispatch bound
pub fn dispatch_timeout_reply(question: &str) -> String {
    format!(
        "Sorry, answering \"{}\" took too long. Please try again.",
        question
    )
}
