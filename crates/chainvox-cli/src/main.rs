// ============================================================================
// chainvox - text front end for the ChainVox assistant
// ============================================================================
// Usage:
//   chainvox ask "what's in 0x…?"          Answer one question
//   chainvox chat                          Interactive session with history
//   chainvox wallet 0x… [--json]           Raw wallet analysis
//   chainvox mints [--limit 7] [--collection 0x…] [--json]
//   chainvox gas | block                   Network snapshot
//   chainvox classify "some text"          Show the routed intent
// ============================================================================

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use chainvox_core::intent;
use chainvox_core::{
    AlchemyClient, AppConfig, ChainDataProvider, ConversationSession, OpenAiClient, QueryDispatcher,
};

/// Ask questions about the Base network
#[derive(Parser)]
#[command(name = "chainvox", version, about = "Ask questions about Base wallets, mints and gas")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question, e.g. "show me the latest mints"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Interactive chat; type "exit" to leave
    Chat,

    /// Show the on-chain facts for one address
    Wallet {
        address: String,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the latest NFT mints
    Mints {
        /// Number of mints to fetch (default from config)
        #[arg(long)]
        limit: Option<u32>,

        /// Only mints from this collection contract
        #[arg(long)]
        collection: Option<String>,

        /// Print the events as JSON
        #[arg(long)]
        json: bool,
    },

    /// Current gas price
    Gas,

    /// Latest block number
    Block,

    /// Show how a question would be routed, without any network calls
    Classify {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("chainvox={}", level).parse()?)
                .add_directive(format!("chainvox_core={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Classify { text } => cmd_classify(&text.join(" ")),
        Commands::Ask { question } => cmd_ask(&config, &question.join(" ")).await,
        Commands::Chat => cmd_chat(&config).await,
        Commands::Wallet { address, json } => cmd_wallet(&config, &address, json).await,
        Commands::Mints {
            limit,
            collection,
            json,
        } => cmd_mints(&config, limit.unwrap_or(config.mint_limit), collection, json).await,
        Commands::Gas => {
            let gas = chain_client(&config)?.get_gas_price().await?;
            println!("Gas price: {}", gas);
            Ok(())
        }
        Commands::Block => {
            let block = chain_client(&config)?.get_latest_block().await?;
            println!("Latest block: {}", block);
            Ok(())
        }
    }
}

fn chain_client(config: &AppConfig) -> Result<Arc<AlchemyClient>> {
    let client = AlchemyClient::from_config(&config.chain, config.retry.clone())
        .map_err(|e| anyhow!("{} (set ALCHEMY_API_KEY or CHAIN_RPC_URL)", e))?;
    Ok(Arc::new(client))
}

fn build_dispatcher(config: &AppConfig) -> Result<QueryDispatcher> {
    let chain = chain_client(config)?;
    let model = OpenAiClient::new(&config.model, config.retry.clone())
        .map_err(|e| anyhow!("Failed to create language model client: {}", e))?;

    Ok(QueryDispatcher::new(chain, Arc::new(model), config.mint_limit))
}

fn cmd_classify(text: &str) -> Result<()> {
    let intent = intent::classify(text);
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}

async fn cmd_ask(config: &AppConfig, question: &str) -> Result<()> {
    let dispatcher = build_dispatcher(config)?;
    let mut session = ConversationSession::new();

    match session.ask(&dispatcher, question).await {
        Some(reply) => println!("{}", reply),
        None => anyhow::bail!("Question is empty"),
    }
    Ok(())
}

async fn cmd_chat(config: &AppConfig) -> Result<()> {
    let dispatcher = build_dispatcher(config)?;
    let mut session = ConversationSession::new();
    info!("Chat session {} started", session.id);

    println!("ChainVox chat on {}. Type \"exit\" to leave.", config.chain.network.as_str());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let input = line.trim();
        if matches!(input, "exit" | "quit") {
            break;
        }

        if let Some(reply) = session.ask(&dispatcher, input).await {
            println!("{}\n", reply);
        }
    }

    info!(
        "Chat session {} ended after {} turns",
        session.id,
        session.history().len()
    );
    Ok(())
}

async fn cmd_wallet(config: &AppConfig, address: &str, json: bool) -> Result<()> {
    let analysis = chain_client(config)?.get_wallet_analysis(address).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("=== {} ===", analysis.address);
    println!(
        "Type:         {}",
        if analysis.is_contract { "contract" } else { "wallet" }
    );
    println!("ETH balance:  {}", analysis.eth_balance);
    println!("Transactions: {}", analysis.transaction_count);

    if analysis.token_balances.is_empty() {
        println!("Tokens:       none");
    } else {
        println!("Tokens:");
        for token in &analysis.token_balances {
            println!(
                "  {:<10} {:<24} {}",
                token.symbol_or_marker(),
                token.name_or_marker(),
                token.amount
            );
        }
    }

    if analysis.looks_inactive() {
        println!("\nThis address looks empty or inactive.");
    }
    Ok(())
}

async fn cmd_mints(config: &AppConfig, limit: u32, collection: Option<String>, json: bool) -> Result<()> {
    let events = chain_client(config)?
        .get_recent_mints_for(limit, collection.as_deref())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No recent mints found.");
        return Ok(());
    }

    println!("{:<12}  {:<44}  {:<12}  {}", "BLOCK", "COLLECTION", "TOKEN", "MINTER");
    println!("{}", "-".repeat(110));
    for event in &events {
        println!(
            "{:<12}  {:<44}  {:<12}  {}",
            event.block_number,
            event
                .collection_label
                .as_deref()
                .or(event.contract_address.as_deref())
                .unwrap_or("-"),
            event.token_id.as_deref().unwrap_or("-"),
            event.minter_address
        );
    }

    println!("\nTotal: {} mints", events.len());
    Ok(())
}
