//! Sequential native-token distribution engine

use alloy::rpc::types::TransactionRequest;
use alloy_network::TransactionBuilder;
use alloy_primitives::{
    utils::{format_ether, parse_ether},
    Address, B256, U256,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::chain::{ChainClient, ReceiptStatus};
use crate::error::{DistributorError, Result};

/// Gas limit of a plain native transfer, used when estimation fails
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Default per-transfer receipt deadline
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Terminal state of one attempted transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Built but not submitted (test mode)
    Simulated,
    /// Submitted and confirmed on-chain
    Confirmed,
    /// Rejected at submission or reverted on-chain
    Failed,
    /// Submitted; no receipt yet (not waited for, or deadline passed)
    Pending,
}

/// One attempted transfer, in batch order
#[derive(Debug, Clone, Serialize)]
pub struct TransferRecord {
    pub timestamp: DateTime<Utc>,
    pub recipient: Address,
    pub nonce: u64,
    pub amount_wei: U256,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub tx_hash: Option<B256>,
    pub error: Option<String>,
    pub status: TransferStatus,
}

/// Full outcome of one distribution run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub sender: Address,
    pub sender_balance_wei: U256,
    pub amount_per_wallet_wei: U256,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub fee_per_transfer_wei: U256,
    pub cost_per_transfer_wei: U256,
    pub required_wei: U256,
    pub starting_nonce: u64,
    pub test_mode: bool,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub confirmed: usize,
    pub failed: usize,
    pub pending: usize,
    pub simulated: usize,
    pub transfers: Vec<TransferRecord>,
}

impl BatchReport {
    fn empty(sender: Address, amount_wei: U256, test_mode: bool) -> Self {
        Self {
            sender,
            sender_balance_wei: U256::ZERO,
            amount_per_wallet_wei: amount_wei,
            gas_price: 0,
            gas_limit: 0,
            fee_per_transfer_wei: U256::ZERO,
            cost_per_transfer_wei: U256::ZERO,
            required_wei: U256::ZERO,
            starting_nonce: 0,
            test_mode,
            started_at: Utc::now(),
            total: 0,
            confirmed: 0,
            failed: 0,
            pending: 0,
            simulated: 0,
            transfers: Vec::new(),
        }
    }

    fn tally(&mut self, record: TransferRecord) {
        match record.status {
            TransferStatus::Simulated => self.simulated += 1,
            TransferStatus::Confirmed => self.confirmed += 1,
            TransferStatus::Failed => self.failed += 1,
            TransferStatus::Pending => self.pending += 1,
        }
        self.total += 1;
        self.transfers.push(record);
    }

    /// True when no transfer ended `Failed`
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Recipients whose transfer ended `Failed`, for re-running a filtered list
    pub fn failed_recipients(&self) -> Vec<Address> {
        self.transfers
            .iter()
            .filter(|t| t.status == TransferStatus::Failed)
            .map(|t| t.recipient)
            .collect()
    }

    /// Human-readable distribution log, one block per transfer
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "POL Distribution Log - {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(&format!("Sender Address: {}\n", self.sender));
        out.push_str(&format!(
            "Sender Balance: {} POL\n",
            format_ether(self.sender_balance_wei)
        ));
        out.push_str(&format!(
            "Amount per wallet: {} POL\n",
            format_ether(self.amount_per_wallet_wei)
        ));
        out.push_str(&format!("Gas Price: {} Gwei\n", gwei(self.gas_price)));
        out.push_str(&format!("Gas Limit: {}\n", self.gas_limit));
        out.push_str(&format!(
            "Gas Cost per transaction: {} POL\n",
            format_ether(self.fee_per_transfer_wei)
        ));
        out.push_str(&format!(
            "Total per transaction: {} POL\n",
            format_ether(self.cost_per_transfer_wei)
        ));
        out.push_str(&format!("Total needed: {} POL\n", format_ether(self.required_wei)));
        out.push_str(&format!(
            "Test Mode: {}\n\n",
            if self.test_mode { "Yes" } else { "No" }
        ));

        let amount = format_ether(self.amount_per_wallet_wei);
        for (i, transfer) in self.transfers.iter().enumerate() {
            let wallet = i + 1;
            match transfer.status {
                TransferStatus::Simulated => {
                    out.push_str(&format!(
                        "Wallet {}: Would send {} POL to {} (nonce {})\n",
                        wallet, amount, transfer.recipient, transfer.nonce
                    ));
                }
                TransferStatus::Confirmed => {
                    out.push_str(&format!(
                        "Wallet {}: Successfully sent {} POL to {}\n",
                        wallet, amount, transfer.recipient
                    ));
                    if let Some(hash) = transfer.tx_hash {
                        out.push_str(&format!("Transaction Hash: {:#x}\n", hash));
                    }
                }
                TransferStatus::Failed => {
                    out.push_str(&format!(
                        "Wallet {}: Failed to send POL to {}\n",
                        wallet, transfer.recipient
                    ));
                    if let Some(error) = &transfer.error {
                        out.push_str(&format!("Error: {}\n", error));
                    }
                }
                TransferStatus::Pending => {
                    out.push_str(&format!(
                        "Wallet {}: Submitted {} POL to {} (unconfirmed)\n",
                        wallet, amount, transfer.recipient
                    ));
                    if let Some(hash) = transfer.tx_hash {
                        out.push_str(&format!("Transaction Hash: {:#x}\n", hash));
                    }
                }
            }
        }

        out
    }
}

/// Parse a decimal POL amount into wei, rejecting zero.
pub fn parse_amount(amount: &str) -> Result<U256> {
    let wei = parse_ether(amount)
        .map_err(|e| DistributorError::InvalidAmount(format!("{}: {}", amount, e)))?;

    if wei.is_zero() {
        return Err(DistributorError::InvalidAmount(
            "amount must be greater than 0".to_string(),
        ));
    }

    Ok(wei)
}

/// Parse and validate the whole recipient list before anything is sent.
///
/// One malformed address aborts the batch; a partial distribution with
/// undefined recipient intent is worse than no distribution.
pub fn parse_recipients(recipients: &[String]) -> Result<Vec<Address>> {
    recipients
        .iter()
        .map(|raw| {
            raw.trim()
                .parse::<Address>()
                .map_err(|e| DistributorError::InvalidAddress {
                    address: raw.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

fn gwei(gas_price: u128) -> String {
    format!("{}", gas_price as f64 / 1e9)
}

/// Sequential distribution engine.
///
/// Nonces are assigned locally from a single upfront query, so two batches
/// running concurrently against the same sender collide. One batch per
/// sender at a time.
pub struct Distributor<C> {
    client: C,
    chain_id: u64,
    receipt_timeout: Duration,
    wait_for_receipts: bool,
}

impl<C: ChainClient> Distributor<C> {
    pub fn new(client: C, chain_id: u64) -> Self {
        Self {
            client,
            chain_id,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            wait_for_receipts: true,
        }
    }

    /// Override the per-transfer receipt deadline
    pub fn receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Record submitted transfers as `Pending` instead of waiting for receipts
    pub fn wait_for_receipts(mut self, wait: bool) -> Self {
        self.wait_for_receipts = wait;
        self
    }

    /// Send `amount_wei` to every recipient, in list order.
    ///
    /// Validation failures abort before any network call; an individual
    /// transfer failure is recorded and the batch continues. The report
    /// always holds one entry per recipient.
    pub async fn distribute(
        &self,
        sender: Address,
        recipients: &[String],
        amount_wei: U256,
        test_mode: bool,
    ) -> Result<BatchReport> {
        if amount_wei.is_zero() {
            return Err(DistributorError::InvalidAmount(
                "amount must be greater than 0".to_string(),
            ));
        }

        let recipients = parse_recipients(recipients)?;
        if recipients.is_empty() {
            info!("Recipient list is empty, nothing to distribute");
            return Ok(BatchReport::empty(sender, amount_wei, test_mode));
        }

        let gas_price = self.client.get_gas_price().await?;
        let starting_nonce = self.client.get_transaction_count(sender).await?;

        // Value transfers are uniform; one estimate covers the batch.
        let draft = self.build_transfer(
            sender,
            recipients[0],
            amount_wei,
            gas_price,
            starting_nonce,
            NATIVE_TRANSFER_GAS,
        );
        let gas_limit = match self.client.estimate_gas(&draft).await {
            Ok(limit) => limit,
            Err(e) => {
                warn!(
                    "Gas estimation failed ({}), falling back to {}",
                    e, NATIVE_TRANSFER_GAS
                );
                NATIVE_TRANSFER_GAS
            }
        };

        let fee_per_transfer = U256::from(gas_price) * U256::from(gas_limit);
        let cost_per_transfer = amount_wei + fee_per_transfer;
        let required = cost_per_transfer * U256::from(recipients.len());

        let sender_balance = self.client.get_balance(sender).await?;
        if sender_balance < required {
            return Err(DistributorError::InsufficientBalance {
                required,
                available: sender_balance,
            });
        }

        info!(
            sender = %sender,
            recipients = recipients.len(),
            amount = %format_ether(amount_wei),
            gas_price,
            gas_limit,
            required = %format_ether(required),
            test_mode,
            "Starting distribution"
        );

        let mut report = BatchReport {
            sender,
            sender_balance_wei: sender_balance,
            amount_per_wallet_wei: amount_wei,
            gas_price,
            gas_limit,
            fee_per_transfer_wei: fee_per_transfer,
            cost_per_transfer_wei: cost_per_transfer,
            required_wei: required,
            starting_nonce,
            test_mode,
            started_at: Utc::now(),
            total: 0,
            confirmed: 0,
            failed: 0,
            pending: 0,
            simulated: 0,
            transfers: Vec::with_capacity(recipients.len()),
        };

        for (index, recipient) in recipients.iter().copied().enumerate() {
            let nonce = starting_nonce + index as u64;
            let record = if test_mode {
                info!(
                    "Would send {} POL to {} (nonce {})",
                    format_ether(amount_wei),
                    recipient,
                    nonce
                );
                self.record(recipient, nonce, amount_wei, gas_price, gas_limit)
                    .status(TransferStatus::Simulated)
            } else {
                let tx = self.build_transfer(
                    sender, recipient, amount_wei, gas_price, nonce, gas_limit,
                );
                self.submit(tx, recipient, nonce, amount_wei, gas_price, gas_limit)
                    .await
            };
            report.tally(record);
        }

        Ok(report)
    }

    async fn submit(
        &self,
        tx: TransactionRequest,
        recipient: Address,
        nonce: u64,
        amount_wei: U256,
        gas_price: u128,
        gas_limit: u64,
    ) -> TransferRecord {
        let base = self.record(recipient, nonce, amount_wei, gas_price, gas_limit);

        let tx_hash = match self.client.sign_and_send(tx).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                warn!("Transfer to {} failed: {}", recipient, e);
                return base.status(TransferStatus::Failed).error(e.to_string());
            }
        };

        info!("Submitted transfer to {} ({:#x})", recipient, tx_hash);
        let base = base.tx_hash(tx_hash);

        if !self.wait_for_receipts {
            return base.status(TransferStatus::Pending);
        }

        match self.client.wait_for_receipt(tx_hash, self.receipt_timeout).await {
            Ok(ReceiptStatus::Confirmed) => {
                info!("Transfer to {} confirmed", recipient);
                base.status(TransferStatus::Confirmed)
            }
            Ok(ReceiptStatus::Failed) => {
                warn!("Transfer to {} reverted ({:#x})", recipient, tx_hash);
                base.status(TransferStatus::Failed)
                    .error("transaction reverted".to_string())
            }
            Ok(ReceiptStatus::TimedOut) => {
                warn!(
                    "No receipt for {:#x} within {:?}; it may still confirm",
                    tx_hash, self.receipt_timeout
                );
                base.status(TransferStatus::Pending)
            }
            // Already submitted, so an RPC hiccup while polling is not a
            // transfer failure.
            Err(e) => {
                warn!("Receipt polling for {:#x} failed: {}", tx_hash, e);
                base.status(TransferStatus::Pending).error(e.to_string())
            }
        }
    }

    fn build_transfer(
        &self,
        sender: Address,
        recipient: Address,
        amount_wei: U256,
        gas_price: u128,
        nonce: u64,
        gas_limit: u64,
    ) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(sender)
            .with_to(recipient)
            .with_value(amount_wei)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(gas_limit)
            .with_chain_id(self.chain_id)
    }

    fn record(
        &self,
        recipient: Address,
        nonce: u64,
        amount_wei: U256,
        gas_price: u128,
        gas_limit: u64,
    ) -> TransferRecord {
        TransferRecord {
            timestamp: Utc::now(),
            recipient,
            nonce,
            amount_wei,
            gas_price,
            gas_limit,
            tx_hash: None,
            error: None,
            status: TransferStatus::Pending,
        }
    }
}

impl TransferRecord {
    fn status(mut self, status: TransferStatus) -> Self {
        self.status = status;
        self
    }

    fn tx_hash(mut self, tx_hash: B256) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }

    fn error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}
