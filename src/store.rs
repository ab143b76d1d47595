//! Flat-file persistence: wallet records, address lists, the funding credential

use alloy_signer_local::PrivateKeySigner;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{DistributorError, Result};
use crate::wallet::WalletRecord;

const ADDRESSES_PREFIX: &str = "public_addresses_";
const ADDRESSES_SUFFIX: &str = ".txt";

/// Paths written by one persist call
#[derive(Debug, Clone)]
pub struct PersistedFiles {
    pub wallet_files: Vec<PathBuf>,
    pub combined_file: PathBuf,
    pub addresses_file: PathBuf,
}

/// Writes wallet batches under a single output directory
pub struct WalletStore {
    out_dir: PathBuf,
}

impl WalletStore {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Persist one file per record, a combined JSON file, and a plaintext
    /// address list, all stamped with the same batch timestamp.
    ///
    /// Files already written stay on disk if a later write fails.
    pub fn persist(&self, records: &[WalletRecord]) -> Result<PersistedFiles> {
        fs::create_dir_all(&self.out_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        let mut wallet_files = Vec::with_capacity(records.len());
        for record in records {
            let path = self
                .out_dir
                .join(format!("wallet_{}_{}.json", timestamp, record.wallet_number));
            fs::write(&path, serde_json::to_string_pretty(record)?)?;
            wallet_files.push(path);
        }

        let combined_file = self.out_dir.join(format!("all_wallets_{}.json", timestamp));
        fs::write(&combined_file, serde_json::to_string_pretty(records)?)?;

        let addresses_file = self
            .out_dir
            .join(format!("{ADDRESSES_PREFIX}{timestamp}{ADDRESSES_SUFFIX}"));
        let mut addresses = records
            .iter()
            .map(|r| r.address.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        addresses.push('\n');
        fs::write(&addresses_file, addresses)?;

        info!(
            count = records.len(),
            dir = %self.out_dir.display(),
            "Persisted wallet batch"
        );

        Ok(PersistedFiles {
            wallet_files,
            combined_file,
            addresses_file,
        })
    }

    /// Newest address-list file in the store directory.
    ///
    /// Timestamped names sort lexicographically, so the maximum name is the
    /// latest batch.
    pub fn latest_addresses_file(&self) -> Result<PathBuf> {
        let mut latest: Option<PathBuf> = None;

        for entry in fs::read_dir(&self.out_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if name.starts_with(ADDRESSES_PREFIX) && name.ends_with(ADDRESSES_SUFFIX) {
                let path = entry.path();
                if latest.as_ref().map_or(true, |l| path > *l) {
                    latest = Some(path);
                }
            }
        }

        latest.ok_or_else(|| {
            DistributorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "no {ADDRESSES_PREFIX}*{ADDRESSES_SUFFIX} files found in {}",
                    self.out_dir.display()
                ),
            ))
        })
    }
}

/// Read a plaintext address list, one address per line.
pub fn load_addresses(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Read the funding private key from `path`.
///
/// Whitespace is stripped and a missing 0x prefix is tolerated; anything
/// that is not 32 bytes of hex is rejected before any network call.
pub fn load_signer(path: &Path) -> Result<PrivateKeySigner> {
    let raw = fs::read_to_string(path).map_err(|e| {
        DistributorError::MissingCredential(format!("cannot read {}: {}", path.display(), e))
    })?;

    let key: String = raw.split_whitespace().collect();
    let hex_part = key.strip_prefix("0x").unwrap_or(&key);

    if hex_part.len() != 64 {
        return Err(DistributorError::MissingCredential(format!(
            "expected 64 hex characters in {}, found {}",
            path.display(),
            hex_part.len()
        )));
    }

    hex_part.parse().map_err(|e| {
        DistributorError::MissingCredential(format!(
            "invalid private key in {}: {}",
            path.display(),
            e
        ))
    })
}
