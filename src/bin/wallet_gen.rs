//! Wallet creation CLI

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pol_distributor::store::WalletStore;
use pol_distributor::wallet;

#[derive(Parser, Debug)]
#[command(name = "wallet-gen")]
#[command(about = "Generate EVM wallets with recovery phrases", long_about = None)]
#[command(version)]
struct Cli {
    /// Number of wallets to generate
    #[arg(short, long, default_value = "1")]
    count: usize,

    /// Print an example record without persisting real keys
    #[arg(short, long)]
    sample: bool,

    /// Directory for the generated files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.sample {
        let sample = wallet::sample_record();
        println!("{}", "Sample wallet record (not persisted):".bold());
        println!("{}", serde_json::to_string_pretty(&sample)?);
        println!("\nThis shows how a single record will look.");
        return Ok(());
    }

    println!("\nGenerating {} wallet(s)...\n", cli.count);

    let records = wallet::generate_batch(cli.count)?;
    let files = WalletStore::new(&cli.out_dir).persist(&records)?;

    println!("{}", "-".repeat(80));
    for (record, path) in records.iter().zip(&files.wallet_files) {
        println!("Wallet #{}", record.wallet_number);
        println!("Address: {}", record.address);
        println!("Private Key: {}", record.private_key);
        println!("Mnemonic Phrase: {}", record.mnemonic);
        println!("Saved to: {}", path.display());
        println!("{}", "-".repeat(80));
    }

    println!(
        "\nAll wallet information saved to: {}",
        files.combined_file.display()
    );
    println!(
        "Public addresses for token distribution saved to: {}",
        files.addresses_file.display()
    );
    println!(
        "\n{}",
        "IMPORTANT: Keep this information secure and never share your private keys or mnemonic phrases!"
            .yellow()
            .bold()
    );
    println!("The mnemonic phrase can be used to recover your wallet - keep it safe!");

    Ok(())
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
