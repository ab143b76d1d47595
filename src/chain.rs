//! Chain client interface consumed by the distribution engine

use alloy::rpc::types::TransactionRequest;
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Outcome of waiting on a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Included in a block and executed successfully
    Confirmed,
    /// Included in a block but reverted
    Failed,
    /// No receipt before the deadline; the transaction may still land later
    TimedOut,
}

/// JSON-RPC operations the engine needs from a node.
///
/// `ProviderManager` is the production implementation; tests substitute a
/// recording mock so batches can run without a node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Native token balance of `address` in wei
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Current gas price in wei
    async fn get_gas_price(&self) -> Result<u128>;

    /// Next usable nonce for `address`
    async fn get_transaction_count(&self, address: Address) -> Result<u64>;

    /// Gas limit estimate for `tx`
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64>;

    /// Sign `tx` locally and submit it, returning the transaction hash
    async fn sign_and_send(&self, tx: TransactionRequest) -> Result<B256>;

    /// Poll for the receipt of `tx_hash` until `timeout` elapses
    async fn wait_for_receipt(&self, tx_hash: B256, timeout: Duration) -> Result<ReceiptStatus>;
}

// A shared client can be handed to the engine while the caller keeps a handle.
#[async_trait]
impl<T: ChainClient + ?Sized> ChainClient for Arc<T> {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        (**self).get_balance(address).await
    }

    async fn get_gas_price(&self) -> Result<u128> {
        (**self).get_gas_price().await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        (**self).get_transaction_count(address).await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        (**self).estimate_gas(tx).await
    }

    async fn sign_and_send(&self, tx: TransactionRequest) -> Result<B256> {
        (**self).sign_and_send(tx).await
    }

    async fn wait_for_receipt(&self, tx_hash: B256, timeout: Duration) -> Result<ReceiptStatus> {
        (**self).wait_for_receipt(tx_hash, timeout).await
    }
}
