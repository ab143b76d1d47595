//! Wallet generation and native POL distribution over JSON-RPC
//!
//! Two workflows built on Alloy 1.0.38:
//!
//! - generate EVM wallets (keypair + BIP-39 recovery phrase) and persist
//!   them as flat files, including a plaintext address list;
//! - distribute a fixed amount of the native token from one funding wallet
//!   to every address on such a list, one signed transaction per recipient,
//!   sequentially, with locally assigned nonces.
//!
//! # Example
//!
//! ```rust,no_run
//! use pol_distributor::prelude::*;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Funding credential, read once at startup
//!     let signer = store::load_signer(Path::new("privatekey.txt"))?;
//!
//!     // Configure provider
//!     let provider = ProviderManager::new(ProviderConfig {
//!         rpc_url: "https://polygon-rpc.com".to_string(),
//!         chain_id: 137,
//!         timeout_seconds: 60,
//!     })?
//!     .with_signer(signer);
//!
//!     let sender = provider.signer_address().unwrap();
//!     let recipients = store::load_addresses(Path::new("public_addresses_20250101_000000.txt"))?;
//!     let amount_wei = distribution::parse_amount("0.25")?;
//!
//!     // Dry run: build everything, submit nothing
//!     let report = Distributor::new(provider, 137)
//!         .distribute(sender, &recipients, amount_wei, true)
//!         .await?;
//!
//!     println!("{}", report.render_text());
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod distribution;
pub mod error;
pub mod provider;
pub mod store;
pub mod wallet;

// Re-export commonly used types
pub use chain::{ChainClient, ReceiptStatus};
pub use distribution::{
    BatchReport, Distributor, TransferRecord, TransferStatus, NATIVE_TRANSFER_GAS,
};
pub use error::{DistributorError, Result};
pub use provider::{ProviderConfig, ProviderManager, RpcProvider};
pub use store::{PersistedFiles, WalletStore};
pub use wallet::{generate_batch, generate_wallet, WalletRecord};

// Re-export Alloy types for convenience
pub use alloy_primitives::{Address, B256, U256};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chain::{ChainClient, ReceiptStatus};
    pub use crate::distribution::{self, BatchReport, Distributor, TransferStatus};
    pub use crate::error::{DistributorError, Result};
    pub use crate::provider::{ProviderConfig, ProviderManager};
    pub use crate::store::{self, WalletStore};
    pub use crate::wallet::{self, WalletRecord};
    pub use alloy_primitives::{Address, B256, U256};
}
