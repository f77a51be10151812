// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Scriptable EIP-1193 wallet for tests: canned accounts, recorded
//! typed-data signatures, monotonic transaction hashes.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use zl_relayer::{TxRequest, WalletError, WalletEvent, WalletProvider};

pub struct MockWallet {
    accounts: Mutex<Vec<Address>>,
    chain: u64,
    tx_counter: AtomicU64,
    reject_signatures: Mutex<bool>,
    reject_transactions: Mutex<bool>,
    pub signed_payloads: Mutex<Vec<Value>>,
    pub sent_transactions: Mutex<Vec<TxRequest>>,
    events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    pub fn new(account: Address) -> Arc<Self> {
        Self::with_accounts(vec![account])
    }

    pub fn with_accounts(accounts: Vec<Address>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            accounts: Mutex::new(accounts),
            chain: 11155111,
            tx_counter: AtomicU64::new(1),
            reject_signatures: Mutex::new(false),
            reject_transactions: Mutex::new(false),
            signed_payloads: Mutex::new(Vec::new()),
            sent_transactions: Mutex::new(Vec::new()),
            events,
        })
    }

    /// A wallet with no exposed account (locked / not yet connected).
    pub fn locked() -> Arc<Self> {
        Self::with_accounts(vec![])
    }

    pub fn reject_next_signature(&self, reject: bool) {
        *self.reject_signatures.lock().unwrap() = reject;
    }

    pub fn reject_transactions(&self, reject: bool) {
        *self.reject_transactions.lock().unwrap() = reject;
    }

    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    pub fn signature_count(&self) -> usize {
        self.signed_payloads.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.sent_transactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.chain)
    }

    async fn sign_typed_data_v4(
        &self,
        _address: Address,
        typed_data: &Value,
    ) -> Result<String, WalletError> {
        if *self.reject_signatures.lock().unwrap() {
            return Err(WalletError::Rejected);
        }
        self.signed_payloads.lock().unwrap().push(typed_data.clone());
        // 65 bytes of deterministic filler, prefixed, as a wallet would return
        let n = self.signed_payloads.lock().unwrap().len() as u8;
        Ok(format!("0x{}", hex::encode([n; 65])))
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, WalletError> {
        if *self.reject_transactions.lock().unwrap() {
            return Err(WalletError::Rejected);
        }
        self.sent_transactions.lock().unwrap().push(tx);
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        Ok(B256::from(U256::from(n)))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
