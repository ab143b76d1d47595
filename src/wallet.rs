//! Wallet generation: mnemonic, keypair, derived address

use alloy_primitives::Address;
use alloy_signer_local::{
    coins_bip39::{English, Mnemonic},
    MnemonicBuilder, PrivateKeySigner,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{DistributorError, Result};

/// Words per generated recovery phrase (128-bit entropy)
pub const MNEMONIC_WORD_COUNT: usize = 12;

/// A generated wallet. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    /// 1-based position within the generated batch
    pub wallet_number: usize,
    /// EIP-55 checksummed address
    pub address: String,
    /// 0x-prefixed hex private key
    pub private_key: String,
    /// BIP-39 recovery phrase
    pub mnemonic: String,
    pub created_at: String,
}

/// Generate a single wallet from fresh OS randomness.
///
/// The key is derived from the mnemonic at the standard Ethereum path
/// (m/44'/60'/0'/0/0), so the phrase restores the same account in any
/// BIP-44 wallet.
pub fn generate_wallet(wallet_number: usize) -> Result<WalletRecord> {
    let mnemonic =
        Mnemonic::<English>::new_with_count(&mut rand::thread_rng(), MNEMONIC_WORD_COUNT)
            .map_err(|e| DistributorError::Signature(format!("Failed to generate mnemonic: {}", e)))?;
    let phrase = mnemonic.to_phrase();

    let signer = MnemonicBuilder::<English>::default()
        .phrase(phrase.as_str())
        .build()
        .map_err(|e| DistributorError::Signature(format!("Failed to derive key: {}", e)))?;

    Ok(WalletRecord {
        wallet_number,
        address: signer.address().to_string(),
        private_key: format!("0x{}", hex::encode(signer.to_bytes())),
        mnemonic: phrase,
        created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

/// Generate `count` independent wallets, numbered from 1.
pub fn generate_batch(count: usize) -> Result<Vec<WalletRecord>> {
    if count == 0 {
        return Err(DistributorError::InvalidCount(count));
    }

    (1..=count).map(generate_wallet).collect()
}

/// Re-derive the address for a hex private key.
pub fn derive_address(private_key: &str) -> Result<Address> {
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .map_err(|e| DistributorError::Signature(format!("Invalid private key: {}", e)))?;

    Ok(signer.address())
}

/// Fixed placeholder record for previewing output. Not a real wallet.
pub fn sample_record() -> WalletRecord {
    WalletRecord {
        wallet_number: 1,
        address: "0x1234567890abcdef1234567890abcdef12345678".to_string(),
        private_key: "0xabcdef1234567890abcdef1234567890abcdef1234567890abcdef1234567890"
            .to_string(),
        mnemonic: "abandon ability able about above absent absorb abstract absurd abuse access accident"
            .to_string(),
        created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
