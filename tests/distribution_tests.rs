//! Integration tests for the distribution engine against a mock node

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::rpc::types::TransactionRequest;
use alloy_primitives::{utils::parse_ether, Address, B256, TxKind, U256};
use async_trait::async_trait;

use pol_distributor::chain::{ChainClient, ReceiptStatus};
use pol_distributor::distribution::{Distributor, TransferStatus, NATIVE_TRANSFER_GAS};
use pol_distributor::error::{DistributorError, Result};

const GAS_PRICE: u128 = 30_000_000_000;

fn addr(byte: u8) -> Address {
    Address::from([byte; 20])
}

fn recipient_list(addresses: &[Address]) -> Vec<String> {
    addresses.iter().map(|a| format!("{}", a)).collect()
}

/// Node stand-in that records every RPC call
#[derive(Default)]
struct MockChain {
    balance: U256,
    starting_nonce: u64,
    reject: HashSet<Address>,
    revert: HashSet<Address>,
    time_out: HashSet<Address>,
    read_calls: AtomicUsize,
    submissions: AtomicUsize,
    receipt_waits: AtomicUsize,
    submitted_nonces: Mutex<Vec<u64>>,
    submitted: Mutex<Vec<(B256, Address)>>,
}

impl MockChain {
    fn funded() -> Self {
        Self {
            balance: parse_ether("100").unwrap(),
            starting_nonce: 7,
            ..Default::default()
        }
    }

    fn submitted_nonces(&self) -> Vec<u64> {
        self.submitted_nonces.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_balance(&self, _address: Address) -> Result<U256> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance)
    }

    async fn get_gas_price(&self) -> Result<u128> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GAS_PRICE)
    }

    async fn get_transaction_count(&self, _address: Address) -> Result<u64> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.starting_nonce)
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(NATIVE_TRANSFER_GAS)
    }

    async fn sign_and_send(&self, tx: TransactionRequest) -> Result<B256> {
        self.submissions.fetch_add(1, Ordering::SeqCst);

        let nonce = tx.nonce.expect("transfer must carry a nonce");
        self.submitted_nonces.lock().unwrap().push(nonce);

        let recipient = match tx.to {
            Some(TxKind::Call(address)) => address,
            other => panic!("transfer must target an address, got {:?}", other),
        };

        if self.reject.contains(&recipient) {
            return Err(DistributorError::Rpc("nonce too low".to_string()));
        }

        let tx_hash = B256::from(U256::from(nonce));
        self.submitted.lock().unwrap().push((tx_hash, recipient));
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256, _timeout: Duration) -> Result<ReceiptStatus> {
        self.receipt_waits.fetch_add(1, Ordering::SeqCst);

        let recipient = self
            .submitted
            .lock()
            .unwrap()
            .iter()
            .find(|(hash, _)| *hash == tx_hash)
            .map(|(_, recipient)| *recipient)
            .expect("receipt requested for unknown transaction");

        if self.revert.contains(&recipient) {
            Ok(ReceiptStatus::Failed)
        } else if self.time_out.contains(&recipient) {
            Ok(ReceiptStatus::TimedOut)
        } else {
            Ok(ReceiptStatus::Confirmed)
        }
    }
}

fn distributor(chain: Arc<MockChain>) -> Distributor<Arc<MockChain>> {
    Distributor::new(chain, 137)
}

#[tokio::test]
async fn zero_amount_fails_without_any_network_call() {
    let chain = Arc::new(MockChain::funded());
    let result = distributor(chain.clone())
        .distribute(addr(9), &recipient_list(&[addr(1)]), U256::ZERO, false)
        .await;

    assert!(matches!(result, Err(DistributorError::InvalidAmount(_))));
    assert_eq!(chain.read_calls.load(Ordering::SeqCst), 0);
    assert_eq!(chain.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_address_aborts_before_anything_is_sent() {
    let chain = Arc::new(MockChain::funded());
    let recipients = vec![format!("{}", addr(1)), "0xnot-an-address".to_string()];

    let result = distributor(chain.clone())
        .distribute(addr(9), &recipients, parse_ether("0.1").unwrap(), false)
        .await;

    match result {
        Err(DistributorError::InvalidAddress { address, .. }) => {
            assert_eq!(address, "0xnot-an-address");
        }
        other => panic!("expected InvalidAddress, got {:?}", other.map(|_| ())),
    }
    assert_eq!(chain.read_calls.load(Ordering::SeqCst), 0);
    assert_eq!(chain.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn insufficient_balance_stops_before_any_submission() {
    let chain = Arc::new(MockChain {
        balance: parse_ether("0.05").unwrap(),
        ..Default::default()
    });

    let result = distributor(chain.clone())
        .distribute(
            addr(9),
            &recipient_list(&[addr(1), addr(2), addr(3)]),
            parse_ether("0.1").unwrap(),
            false,
        )
        .await;

    match result {
        Err(DistributorError::InsufficientBalance { required, available }) => {
            let fee = U256::from(GAS_PRICE) * U256::from(NATIVE_TRANSFER_GAS);
            let expected = (parse_ether("0.1").unwrap() + fee) * U256::from(3u64);
            assert_eq!(required, expected);
            assert_eq!(available, parse_ether("0.05").unwrap());
        }
        other => panic!("expected InsufficientBalance, got {:?}", other.map(|_| ())),
    }
    // Read-only queries are fine, submissions are not
    assert!(chain.read_calls.load(Ordering::SeqCst) > 0);
    assert_eq!(chain.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_mode_simulates_every_recipient_without_submitting() {
    let chain = Arc::new(MockChain::funded());
    let report = distributor(chain.clone())
        .distribute(
            addr(9),
            &recipient_list(&[addr(1), addr(2), addr(3)]),
            parse_ether("0.1").unwrap(),
            true,
        )
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.simulated, 3);
    assert!(report
        .transfers
        .iter()
        .all(|t| t.status == TransferStatus::Simulated));
    assert!(report.all_succeeded());
    assert_eq!(chain.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nonces_cover_the_batch_without_gaps_or_repeats() {
    let chain = Arc::new(MockChain::funded());
    let report = distributor(chain.clone())
        .distribute(
            addr(9),
            &recipient_list(&[addr(1), addr(2), addr(3), addr(4)]),
            parse_ether("0.1").unwrap(),
            false,
        )
        .await
        .unwrap();

    assert_eq!(chain.submitted_nonces(), vec![7, 8, 9, 10]);
    assert_eq!(report.starting_nonce, 7);
    assert_eq!(report.confirmed, 4);

    let recorded: Vec<u64> = report.transfers.iter().map(|t| t.nonce).collect();
    assert_eq!(recorded, vec![7, 8, 9, 10]);
}

#[tokio::test]
async fn one_rejection_does_not_stop_the_rest_of_the_batch() {
    let mut chain = MockChain::funded();
    chain.reject.insert(addr(2));
    let chain = Arc::new(chain);

    let report = distributor(chain.clone())
        .distribute(
            addr(9),
            &recipient_list(&[addr(1), addr(2), addr(3)]),
            parse_ether("0.1").unwrap(),
            false,
        )
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.confirmed, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.all_succeeded());
    assert_eq!(report.failed_recipients(), vec![addr(2)]);

    let failed = &report.transfers[1];
    assert_eq!(failed.status, TransferStatus::Failed);
    assert!(failed.tx_hash.is_none());
    assert!(failed.error.as_deref().unwrap().contains("nonce too low"));

    // All three were attempted, each with its own nonce
    assert_eq!(chain.submissions.load(Ordering::SeqCst), 3);
    assert_eq!(chain.submitted_nonces(), vec![7, 8, 9]);
}

#[tokio::test]
async fn reverted_transfer_is_failed_but_keeps_its_hash() {
    let mut chain = MockChain::funded();
    chain.revert.insert(addr(2));
    let chain = Arc::new(chain);

    let report = distributor(chain.clone())
        .distribute(
            addr(9),
            &recipient_list(&[addr(1), addr(2)]),
            parse_ether("0.1").unwrap(),
            false,
        )
        .await
        .unwrap();

    let reverted = &report.transfers[1];
    assert_eq!(reverted.status, TransferStatus::Failed);
    assert!(reverted.tx_hash.is_some());
    assert!(!report.all_succeeded());
}

#[tokio::test]
async fn receipt_timeout_leaves_the_transfer_pending() {
    let mut chain = MockChain::funded();
    chain.time_out.insert(addr(1));
    let chain = Arc::new(chain);

    let report = distributor(chain.clone())
        .distribute(
            addr(9),
            &recipient_list(&[addr(1)]),
            parse_ether("0.1").unwrap(),
            false,
        )
        .await
        .unwrap();

    let pending = &report.transfers[0];
    assert_eq!(pending.status, TransferStatus::Pending);
    assert!(pending.tx_hash.is_some());
    // A transfer that may still confirm is not a failure
    assert!(report.all_succeeded());
}

#[tokio::test]
async fn no_wait_mode_skips_receipt_polling() {
    let chain = Arc::new(MockChain::funded());
    let report = distributor(chain.clone())
        .wait_for_receipts(false)
        .distribute(
            addr(9),
            &recipient_list(&[addr(1), addr(2)]),
            parse_ether("0.1").unwrap(),
            false,
        )
        .await
        .unwrap();

    assert_eq!(report.pending, 2);
    assert_eq!(chain.receipt_waits.load(Ordering::SeqCst), 0);
    assert_eq!(chain.submissions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_recipient_list_is_a_no_op() {
    let chain = Arc::new(MockChain::funded());
    let report = distributor(chain.clone())
        .distribute(addr(9), &[], parse_ether("0.1").unwrap(), false)
        .await
        .unwrap();

    assert_eq!(report.total, 0);
    assert!(report.transfers.is_empty());
    assert_eq!(chain.read_calls.load(Ordering::SeqCst), 0);
    assert_eq!(chain.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_recipients_each_get_their_own_transfer() {
    let chain = Arc::new(MockChain::funded());
    let report = distributor(chain.clone())
        .distribute(
            addr(9),
            &recipient_list(&[addr(1), addr(1)]),
            parse_ether("0.1").unwrap(),
            false,
        )
        .await
        .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.confirmed, 2);
    assert_eq!(chain.submitted_nonces(), vec![7, 8]);
}

#[tokio::test]
async fn report_renders_without_leaking_anything_but_addresses() {
    let chain = Arc::new(MockChain::funded());
    let report = distributor(chain.clone())
        .distribute(
            addr(9),
            &recipient_list(&[addr(1), addr(2)]),
            parse_ether("0.1").unwrap(),
            true,
        )
        .await
        .unwrap();

    let text = report.render_text();
    assert!(text.contains(&format!("{}", addr(1))));
    assert!(text.contains(&format!("{}", addr(2))));
    assert!(text.contains("Test Mode: Yes"));
    assert!(text.contains("Total needed:"));
}
