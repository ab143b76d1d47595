//! Provider configuration and management

use alloy::rpc::types::TransactionRequest;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::chain::{ChainClient, ReceiptStatus};
use crate::error::{DistributorError, Result};

/// How often `wait_for_receipt` polls the node
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Provider type with the default filler stack
pub type RpcProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// RPC endpoint URL (HTTP)
    pub rpc_url: String,
    /// Chain ID
    pub chain_id: u64,
    /// Optional timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    30
}

/// Provider builder and manager
#[derive(Clone)]
pub struct ProviderManager {
    config: ProviderConfig,
    provider: Arc<RpcProvider>,
    wallet: Option<Arc<EthereumWallet>>,
}

impl ProviderManager {
    /// Create a new provider manager
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http_url: reqwest::Url = config
            .rpc_url
            .parse()
            .map_err(|e| DistributorError::Configuration(format!("Invalid RPC URL: {}", e)))?;

        let provider = ProviderBuilder::new().connect_http(http_url);

        Ok(Self {
            config,
            provider: Arc::new(provider),
            wallet: None,
        })
    }

    /// Attach the funding signer. The key stays inside the wallet and is
    /// dropped with the manager.
    pub fn with_signer(mut self, signer: PrivateKeySigner) -> Self {
        self.wallet = Some(Arc::new(EthereumWallet::from(signer)));
        self
    }

    /// Get the provider
    pub fn provider(&self) -> Arc<RpcProvider> {
        Arc::clone(&self.provider)
    }

    /// Get chain ID
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Get provider configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Check connection to the RPC endpoint
    pub async fn check_connection(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| DistributorError::Rpc(format!("Failed to get block number: {}", e)))
    }

    /// Funding address (if a signer is attached)
    pub fn signer_address(&self) -> Option<Address> {
        self.wallet.as_ref().map(|w| w.default_signer().address())
    }
}

#[async_trait]
impl ChainClient for ProviderManager {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| DistributorError::Rpc(format!("Failed to get balance: {}", e)))
    }

    async fn get_gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| DistributorError::Rpc(format!("Failed to get gas price: {}", e)))
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(|e| DistributorError::Rpc(format!("Failed to get transaction count: {}", e)))
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        self.provider
            .estimate_gas(tx.clone())
            .await
            .map_err(|e| DistributorError::Rpc(format!("Failed to estimate gas: {}", e)))
    }

    async fn sign_and_send(&self, tx: TransactionRequest) -> Result<B256> {
        let wallet = self.wallet.as_ref().ok_or_else(|| {
            DistributorError::Signature("no signer attached to provider".to_string())
        })?;

        let envelope = tx
            .build(wallet.as_ref())
            .await
            .map_err(|e| DistributorError::Signature(format!("Failed to sign transaction: {}", e)))?;

        let pending = self
            .provider
            .send_tx_envelope(envelope)
            .await
            .map_err(|e| DistributorError::Rpc(format!("Transaction rejected: {}", e)))?;

        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256, timeout: Duration) -> Result<ReceiptStatus> {
        let deadline = Instant::now() + timeout;

        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| DistributorError::Rpc(format!("Failed to fetch receipt: {}", e)))?;

            match receipt {
                Some(receipt) if receipt.status() => return Ok(ReceiptStatus::Confirmed),
                Some(_) => return Ok(ReceiptStatus::Failed),
                None if Instant::now() >= deadline => return Ok(ReceiptStatus::TimedOut),
                None => sleep(RECEIPT_POLL_INTERVAL).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 137,
            timeout_seconds: default_timeout(),
        }
    }

    #[test]
    fn test_provider_config_default() {
        assert_eq!(test_config().timeout_seconds, 30);
    }

    #[test]
    fn test_provider_manager_creation() {
        let manager = ProviderManager::new(test_config());
        assert!(manager.is_ok());
    }

    #[test]
    fn test_invalid_rpc_url_rejected() {
        let config = ProviderConfig {
            rpc_url: "not a url".to_string(),
            chain_id: 137,
            timeout_seconds: 30,
        };

        match ProviderManager::new(config) {
            Err(DistributorError::Configuration(_)) => {}
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_no_signer_means_no_sender() {
        let manager = ProviderManager::new(test_config()).unwrap();
        assert!(manager.signer_address().is_none());
    }

    #[test]
    fn test_signer_address_matches_key() {
        let signer: PrivateKeySigner =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        let expected = signer.address();

        let manager = ProviderManager::new(test_config()).unwrap().with_signer(signer);
        assert_eq!(manager.signer_address(), Some(expected));
    }
}
