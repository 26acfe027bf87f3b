//! rent-cli: Inspect and maintain a rent node's persisted state.
//!
//! Opens the RocksDB state directory read-write, so it must not run against
//! a data directory that a live node holds open.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use rent_core::types::{Address, EvictBlock};
use rent_node_lib::{NodeConfig, RentNode};

/// Storage rent state inspector.
#[derive(Parser)]
#[command(name = "rent-cli")]
#[command(version, about = "Inspect storage rent balances and eviction schedules.")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Configuration file (TOML). `RENT__*` environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides the configured one).
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level filter (overrides the configured one).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: text or json (overrides the configured one).
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an account's balances, rent fields and eviction block.
    Show(AddressArgs),
    /// Print an account's stored rent balance.
    Balance(AddressArgs),
    /// List accounts whose eviction block has passed at a given block.
    Due(DueArgs),
    /// Print the state commitment.
    Digest,
    /// Print row counts and the last persisted block.
    Stats,
    /// Compact the state database.
    Compact,
    /// Print the effective configuration.
    Params,
}

#[derive(Args)]
struct AddressArgs {
    /// Account address (hex, optional 0x prefix).
    address: String,
}

#[derive(Args)]
struct DueArgs {
    /// Block to evaluate (default: the block after the last persisted one).
    #[arg(short, long)]
    block: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = NodeConfig::load(cli.global.config.as_deref()).context("loading config")?;
    if let Some(dir) = cli.global.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.global.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.global.log_format {
        config.log_format = format;
    }
    config.validate().context("invalid config")?;

    init_logging(&config.log_level, &config.log_format);

    if let Commands::Params = cli.command {
        return print_params(&config, cli.global.json);
    }

    info!(data_dir = %config.data_dir.display(), "opening rent state");
    let node = RentNode::open(config).context("opening rent state")?;
    let json = cli.global.json;

    match cli.command {
        Commands::Show(args) => show(&node, &args, json),
        Commands::Balance(args) => balance(&node, &args, json),
        Commands::Due(args) => due(&node, &args, json),
        Commands::Digest => digest(&node, json),
        Commands::Stats => stats(&node, json),
        Commands::Compact => {
            node.compact().context("compaction failed")?;
            println!("compacted");
            Ok(())
        }
        Commands::Params => Ok(()),
    }
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse()
        .with_context(|| format!("invalid address: {s}"))
}

fn format_evict(evict: EvictBlock) -> String {
    match evict {
        EvictBlock::At(b) => b.to_string(),
        EvictBlock::Never => "never".to_string(),
    }
}

fn show(node: &RentNode, args: &AddressArgs, json: bool) -> Result<()> {
    let address = parse_address(&args.address)?;
    let Some(account) = node.account(&address) else {
        if json {
            println!("null");
        } else {
            println!("{address}: not found");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }

    let rent = account.rent();
    println!("Address:        {address}");
    println!("Balance:        {}", account.balance);
    println!("Nonce:          {}", account.nonce);
    println!("Code words:     {}", rent.code_word_count());
    println!("Storage words:  {}", rent.storage_word_count());
    println!("Rent balance:   {}", rent.rent_balance());
    if rent.is_unsettled() {
        println!("Last paid:      unsettled (awaiting migration)");
    } else {
        println!("Last paid:      {}", rent.rent_last_paid());
    }
    println!(
        "Cost per block: {}",
        rent.cost_per_block(node.processor().calculator())
    );
    println!("Evict block:    {}", format_evict(rent.rent_evict_block()));
    Ok(())
}

fn balance(node: &RentNode, args: &AddressArgs, json: bool) -> Result<()> {
    let address = parse_address(&args.address)?;
    let balance = node.rent_balance_of(&address);
    if json {
        println!(
            "{}",
            serde_json::json!({ "address": address.to_string(), "rent_balance": balance })
        );
    } else {
        println!("{balance}");
    }
    Ok(())
}

fn due(node: &RentNode, args: &DueArgs, json: bool) -> Result<()> {
    let block = args
        .block
        .unwrap_or_else(|| node.last_block().map_or(0, |b| b.saturating_add(1)));
    let due: Vec<String> = node.due_by(block).iter().map(Address::to_string).collect();
    if json {
        println!(
            "{}",
            serde_json::json!({ "block": block, "due": due })
        );
    } else {
        println!("{} account(s) due at block {block}", due.len());
        for address in due {
            println!("  {address}");
        }
    }
    Ok(())
}

fn digest(node: &RentNode, json: bool) -> Result<()> {
    let digest = hex::encode(node.digest());
    if json {
        println!(
            "{}",
            serde_json::json!({ "last_block": node.last_block(), "digest": digest })
        );
    } else {
        println!("{digest}");
    }
    Ok(())
}

fn stats(node: &RentNode, json: bool) -> Result<()> {
    let stats = node
        .store_stats()
        .context("reading store stats")?
        .unwrap_or_default();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Accounts:   {}", stats.accounts);
        println!("Slots:      {}", stats.slots);
        match stats.last_block {
            Some(b) => println!("Last block: {b}"),
            None => println!("Last block: none"),
        }
    }
    Ok(())
}

fn print_params(config: &NodeConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }
    let rent = &config.rent;
    println!("Data dir:          {}", config.data_dir.display());
    println!("Eager migration:   {}", config.eager_migration);
    println!("Account cost:      {}", rent.account_cost);
    println!("Word cost:         {}", rent.word_cost);
    println!("Stipend:           {}", rent.stipend);
    println!("Upgrade block:     {}", rent.upgrade_block);
    println!("Grace blocks:      {}", rent.migration_grace_blocks);
    println!("Eviction boundary: {:?}", rent.eviction_boundary);
    Ok(())
}

/// Initialize tracing with the given level and format.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["rent-cli", "due", "--block", "9", "--json"]).unwrap();
        assert!(cli.global.json);
        assert!(matches!(cli.command, Commands::Due(DueArgs { block: Some(9) })));
    }

    #[test]
    fn parse_address_accepts_prefix() {
        let a = parse_address("0x0000000000000000000000000000000000000001").unwrap();
        assert_eq!(a, Address::from_low_u64(1));
        assert!(parse_address("xyz").is_err());
    }

    #[test]
    fn format_evict_never() {
        assert_eq!(format_evict(EvictBlock::Never), "never");
        assert_eq!(format_evict(EvictBlock::At(12)), "12");
    }
}
