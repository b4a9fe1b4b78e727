//! Singularity CLI
//!
//! Command-line interface for the tracked lists:
//! - View a list with fresh market data or balances
//! - Add and remove coins or wallet addresses
//! - Set portfolio amounts and show the valuation
//! - Generate a config file

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use singularity::config::{generate_default_config, Config};
use singularity::enrichment::fields;
use singularity::format;
use singularity::portfolio::{valuate, Valuation};
use singularity::services::{Services, PORTFOLIO};
use singularity::storage::IdentifierKind;
use singularity::sync::{EntryStatus, SyncView, UnavailableReason, ViewEntry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "singularity")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track coins, portfolio holdings and wallets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a list with fresh enrichment
    View {
        /// List name (watchlist, portfolio, wallets)
        namespace: String,
    },

    /// Add a coin id or wallet address to a list
    Add {
        namespace: String,
        id: String,
    },

    /// Remove a coin id or wallet address from a list
    Remove {
        namespace: String,
        id: String,
    },

    /// Show the registered lists
    Lists,

    /// Set the amount held of a coin (0 removes the holding)
    Hold {
        coin: String,
        amount: f64,
    },

    /// Show the portfolio with its total value
    Portfolio,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        return write_config(output.as_ref());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    singularity::logging::init(&config.logging);

    let services = Services::from_config(&config).context("failed to start services")?;
    let sync = &services.sync;

    match cli.command {
        Commands::View { namespace } => {
            let view = sync.view(&namespace).await?;
            render_view(&view, kind_of(&services, &namespace), cli.format)?;
        }

        Commands::Add { namespace, id } => {
            let view = sync.add_and_refresh(&namespace, &id).await?;
            render_view(&view, kind_of(&services, &namespace), cli.format)?;
        }

        Commands::Remove { namespace, id } => {
            let view = services.remove(&namespace, &id).await?;
            render_view(&view, kind_of(&services, &namespace), cli.format)?;
        }

        Commands::Lists => {
            let mut rows = Vec::new();
            for ns in sync.namespaces() {
                let count = sync.list(&ns.key).await?.len();
                let client = sync.client_name(&ns.key)?;
                rows.push(serde_json::json!({
                    "key": ns.key,
                    "kind": ns.kind.as_str(),
                    "client": client,
                    "count": count,
                }));
            }

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Table => {
                    println!("{:<12} {:<10} {:<12} {}", "List", "Kind", "Source", "Count");
                    println!("{}", "-".repeat(44));
                    for row in &rows {
                        println!(
                            "{:<12} {:<10} {:<12} {}",
                            row["key"].as_str().unwrap_or_default(),
                            row["kind"].as_str().unwrap_or_default(),
                            row["client"].as_str().unwrap_or_default(),
                            row["count"]
                        );
                    }
                }
            }
        }

        Commands::Hold { coin, amount } => {
            let holdings = services.holdings.set_amount(&coin, amount)?;
            let view = if amount > 0.0 {
                sync.add_and_refresh(PORTFOLIO, &coin).await?
            } else {
                sync.view(PORTFOLIO).await?
            };
            render_portfolio(&view, &valuate(&view, &holdings), cli.format)?;
        }

        Commands::Portfolio => {
            let view = sync.view(PORTFOLIO).await?;
            let valuation = valuate(&view, &services.holdings.load());
            render_portfolio(&view, &valuation, cli.format)?;
        }

        Commands::Config { output } => write_config(output.as_ref())?,
    }

    Ok(())
}

fn write_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            // Create parent directory if needed
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }
    Ok(())
}

fn kind_of(services: &Services, namespace: &str) -> IdentifierKind {
    services
        .sync
        .namespace(namespace)
        .map(|ns| ns.kind)
        .unwrap_or(IdentifierKind::CoinId)
}

fn render_view(view: &SyncView, kind: IdentifierKind, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    print_warnings(view);
    if view.is_empty() {
        println!("'{}' is empty.", view.namespace);
        println!();
        println!("Add something with:");
        println!("  singularity add {} <id>", view.namespace);
        return Ok(());
    }

    match kind {
        IdentifierKind::CoinId => {
            println!(
                "{:<20} {:<8} {:>16} {:>9} {:>10}",
                "Coin", "Symbol", "Price", "24h", "Mkt Cap"
            );
            println!("{}", "-".repeat(67));
            for entry in &view.entries {
                let record = entry.record();
                let number = |name| record.and_then(|r| r.get_number(name));
                println!(
                    "{:<20} {:<8} {:>16} {:>9} {:>10}",
                    entry.id,
                    record
                        .and_then(|r| r.get_text(fields::SYMBOL))
                        .map(str::to_uppercase)
                        .unwrap_or_default(),
                    number(fields::CURRENT_PRICE)
                        .map(format::price)
                        .unwrap_or_else(|| status_label(entry)),
                    number(fields::PRICE_CHANGE_24H)
                        .map(format::percent)
                        .unwrap_or_default(),
                    number(fields::MARKET_CAP)
                        .map(format::compact)
                        .unwrap_or_default(),
                );
            }
        }
        IdentifierKind::Address => {
            println!("{:<44} {:>20}", "Address", "Balance");
            println!("{}", "-".repeat(65));
            for entry in &view.entries {
                println!(
                    "{:<44} {:>20}",
                    entry.id,
                    entry
                        .record()
                        .and_then(|r| r.get_number(fields::BALANCE))
                        .map(format::balance)
                        .unwrap_or_else(|| status_label(entry)),
                );
            }
        }
    }
    Ok(())
}

fn render_portfolio(
    view: &SyncView,
    valuation: &Valuation,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        let body = serde_json::json!({ "view": view, "valuation": valuation });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    print_warnings(view);
    println!("{:<20} {:>14} {:>16} {:>16}", "Coin", "Amount", "Price", "Value");
    println!("{}", "-".repeat(69));
    for (row, entry) in valuation.rows.iter().zip(&view.entries) {
        println!(
            "{:<20} {:>14} {:>16} {:>16}",
            row.id,
            format::balance(row.amount),
            row.price
                .map(format::price)
                .unwrap_or_else(|| status_label(entry)),
            row.value.map(format::usd).unwrap_or_else(|| "-".to_string()),
        );
    }
    println!();
    println!("Total Portfolio Value: {}", format::usd(valuation.total_value));
    Ok(())
}

fn status_label(entry: &ViewEntry) -> String {
    match &entry.status {
        EntryStatus::Pending => "loading".to_string(),
        EntryStatus::Enriched { .. } => "-".to_string(),
        EntryStatus::Unavailable {
            reason: UnavailableReason::NotReturned,
        } => "unknown".to_string(),
        EntryStatus::Unavailable {
            reason: UnavailableReason::RemoteUnavailable(_),
        } => "unavailable".to_string(),
    }
}

fn print_warnings(view: &SyncView) {
    if let Some(error) = &view.remote_error {
        eprintln!("warning: data source unavailable: {}", error);
    }
    if let Some(warning) = &view.storage_warning {
        eprintln!("warning: {}", warning);
    }
}
