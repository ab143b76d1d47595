//! Native POL distribution CLI

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pol_distributor::distribution::{self, BatchReport, Distributor};
use pol_distributor::provider::{ProviderConfig, ProviderManager};
use pol_distributor::store::{self, WalletStore};

#[derive(Parser, Debug)]
#[command(name = "pol-distribute")]
#[command(about = "Distribute native POL to a list of recipient wallets", long_about = None)]
#[command(version)]
struct Cli {
    /// Amount of POL to send to each wallet
    #[arg(short, long)]
    amount: String,

    /// Simulate transactions without sending
    #[arg(short, long)]
    test: bool,

    /// RPC endpoint URL
    #[arg(short, long, env = "RPC_URL", default_value = "https://polygon-rpc.com")]
    rpc_url: String,

    /// Chain ID
    #[arg(long, env = "CHAIN_ID", default_value = "137")]
    chain_id: u64,

    /// File holding the funding wallet's private key
    #[arg(short = 'k', long, default_value = "privatekey.txt")]
    key_file: PathBuf,

    /// Address list to fund (defaults to the newest public_addresses_*.txt in --wallet-dir)
    #[arg(long)]
    recipients: Option<PathBuf>,

    /// Directory holding generated wallet files
    #[arg(long, default_value = ".")]
    wallet_dir: PathBuf,

    /// Seconds to wait for each receipt
    #[arg(long, default_value = "120")]
    receipt_timeout: u64,

    /// Submit without waiting for receipts
    #[arg(long)]
    no_wait: bool,

    /// Distribution log format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Where to write the distribution log (defaults to a timestamped file)
    #[arg(long)]
    save_results: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Everything here fails fast, before any network call
    let amount_wei = distribution::parse_amount(&cli.amount)?;
    let signer = store::load_signer(&cli.key_file)?;

    let recipients_file = match &cli.recipients {
        Some(path) => path.clone(),
        None => WalletStore::new(&cli.wallet_dir).latest_addresses_file()?,
    };
    println!("Using recipient list: {}", recipients_file.display());
    let recipients = store::load_addresses(&recipients_file)?;

    let provider = ProviderManager::new(ProviderConfig {
        rpc_url: cli.rpc_url.clone(),
        chain_id: cli.chain_id,
        timeout_seconds: 60,
    })
    .context("Failed to create provider")?
    .with_signer(signer);

    let sender = provider
        .signer_address()
        .context("Provider has no signer attached")?;

    let block_number = provider
        .check_connection()
        .await
        .context("Failed to connect to RPC endpoint")?;
    info!("Connected to chain {} at block {}", cli.chain_id, block_number);

    let report = Distributor::new(provider, cli.chain_id)
        .receipt_timeout(Duration::from_secs(cli.receipt_timeout))
        .wait_for_receipts(!cli.no_wait)
        .distribute(sender, &recipients, amount_wei, cli.test)
        .await?;

    print_summary(&report);

    let log_path = write_log(&report, &cli)?;
    println!(
        "\n{} complete! Check {} for detailed logs.",
        if cli.test { "Simulation" } else { "Distribution" },
        log_path.display()
    );

    // Failed transfers make the whole run exit non-zero; pending and
    // simulated entries do not.
    if !report.all_succeeded() {
        anyhow::bail!("{} of {} transfers failed", report.failed, report.total);
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("{}", "Distribution summary".bold());
    println!("  Recipients: {}", report.total);
    if report.simulated > 0 {
        println!("  {}: {}", "Simulated".cyan(), report.simulated);
    }
    if report.confirmed > 0 {
        println!("  {}: {}", "Confirmed".green(), report.confirmed);
    }
    if report.pending > 0 {
        println!("  {}: {}", "Pending".yellow(), report.pending);
    }
    if report.failed > 0 {
        println!("  {}: {}", "Failed".red().bold(), report.failed);
        for recipient in report.failed_recipients() {
            println!("    - {}", recipient);
        }
    }
}

fn write_log(report: &BatchReport, cli: &Cli) -> Result<PathBuf> {
    let (extension, contents) = match cli.output {
        OutputFormat::Text => ("txt", report.render_text()),
        OutputFormat::Json => ("json", serde_json::to_string_pretty(report)?),
    };

    let path = match &cli.save_results {
        Some(path) => path.clone(),
        None => PathBuf::from(format!(
            "pol_distribution_log_{}.{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            extension
        )),
    };

    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write distribution log to {}", path.display()))?;

    Ok(path)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
