// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Wallet provider abstraction: the EIP-1193 request/subscribe surface, plus
//! a directory supporting both a single injected provider and the
//! announce/request broadcast pattern used when several wallets are present.

use crate::error::{RelayerError, WalletError};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{sleep, Duration};
use tracing::debug;

/// How long `resolve()` waits for announcements after emitting a request.
const ANNOUNCE_GRACE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// A plain transaction submission routed through the wallet. Calldata is
/// ABI-encoded by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

/// The browser wallet, consumed through its request-based RPC.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// `eth_signTypedData_v4`; returns the signature as a `0x` hex string
    async fn sign_typed_data_v4(
        &self,
        address: Address,
        typed_data: &Value,
    ) -> Result<String, WalletError>;

    /// `eth_sendTransaction`; returns the transaction hash
    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, WalletError>;

    /// Account/chain change notifications
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

/// Identity a wallet announces alongside its provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletInfo {
    pub name: String,
    pub rdns: String,
}

struct AnnouncedWallet {
    info: WalletInfo,
    provider: Arc<dyn WalletProvider>,
}

/// Registry of wallet providers. A host with a single wallet sets the
/// injected slot; hosts with several wallets announce each one, and callers
/// emit a request to prompt late announcements.
pub struct WalletDirectory {
    injected: RwLock<Option<Arc<dyn WalletProvider>>>,
    announced: RwLock<Vec<AnnouncedWallet>>,
    request_tx: broadcast::Sender<()>,
}

impl WalletDirectory {
    pub fn new() -> Arc<Self> {
        let (request_tx, _) = broadcast::channel(8);
        Arc::new(Self {
            injected: RwLock::new(None),
            announced: RwLock::new(Vec::new()),
            request_tx,
        })
    }

    /// Register the single injected provider (the `window.ethereum` analogue).
    pub async fn set_injected(&self, provider: Arc<dyn WalletProvider>) {
        *self.injected.write().await = Some(provider);
    }

    /// Announce a provider. Re-announcing the same rdns replaces the entry.
    pub async fn announce(&self, info: WalletInfo, provider: Arc<dyn WalletProvider>) {
        let mut announced = self.announced.write().await;
        if let Some(existing) = announced.iter_mut().find(|w| w.info.rdns == info.rdns) {
            existing.provider = provider;
        } else {
            announced.push(AnnouncedWallet { info, provider });
        }
    }

    /// Wallet adapters listen on this channel and announce themselves when a
    /// request is emitted.
    pub fn on_request(&self) -> broadcast::Receiver<()> {
        self.request_tx.subscribe()
    }

    /// Resolve a usable provider: the injected slot wins; otherwise emit an
    /// announce request, wait briefly, and take the first announced wallet.
    pub async fn resolve(&self) -> Result<Arc<dyn WalletProvider>, RelayerError> {
        if let Some(provider) = self.injected.read().await.clone() {
            return Ok(provider);
        }
        // Ignore send errors: no adapter listening just means nothing new
        // will be announced during the grace period.
        let _ = self.request_tx.send(());
        if self.announced.read().await.is_empty() {
            sleep(ANNOUNCE_GRACE).await;
        }
        let announced = self.announced.read().await;
        match announced.first() {
            Some(wallet) => {
                debug!(wallet = %wallet.info.rdns, "resolved announced wallet provider");
                Ok(wallet.provider.clone())
            }
            None => Err(RelayerError::NoWallet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullWallet {
        chain: u64,
        events: broadcast::Sender<WalletEvent>,
    }

    impl NullWallet {
        fn new() -> Arc<Self> {
            Self::on_chain(11155111)
        }

        fn on_chain(chain: u64) -> Arc<Self> {
            let (events, _) = broadcast::channel(8);
            Arc::new(Self { chain, events })
        }
    }

    #[async_trait]
    impl WalletProvider for NullWallet {
        async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
            Ok(vec![])
        }
        async fn chain_id(&self) -> Result<u64, WalletError> {
            Ok(self.chain)
        }
        async fn sign_typed_data_v4(
            &self,
            _address: Address,
            _typed_data: &Value,
        ) -> Result<String, WalletError> {
            Err(WalletError::Rejected)
        }
        async fn send_transaction(&self, _tx: TxRequest) -> Result<B256, WalletError> {
            Err(WalletError::Rejected)
        }
        fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
            self.events.subscribe()
        }
    }

    #[tokio::test]
    async fn injected_slot_wins_over_announcements() {
        let directory = WalletDirectory::new();
        directory.set_injected(NullWallet::on_chain(1)).await;
        directory
            .announce(
                WalletInfo {
                    name: "Other".into(),
                    rdns: "io.other".into(),
                },
                NullWallet::on_chain(2),
            )
            .await;
        let resolved = directory.resolve().await.unwrap();
        assert_eq!(resolved.chain_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn resolves_announced_wallet_when_nothing_is_injected() {
        let directory = WalletDirectory::new();
        directory
            .announce(
                WalletInfo {
                    name: "Announced".into(),
                    rdns: "io.announced".into(),
                },
                NullWallet::new(),
            )
            .await;
        assert!(directory.resolve().await.is_ok());
    }

    #[tokio::test]
    async fn errors_when_no_provider_exists() {
        let directory = WalletDirectory::new();
        assert!(matches!(
            directory.resolve().await,
            Err(RelayerError::NoWallet)
        ));
    }

    #[tokio::test]
    async fn announce_request_reaches_listening_adapters() {
        let directory = WalletDirectory::new();
        let mut requests = directory.on_request();
        let dir = directory.clone();
        tokio::spawn(async move {
            if requests.recv().await.is_ok() {
                dir.announce(
                    WalletInfo {
                        name: "Late".into(),
                        rdns: "io.late".into(),
                    },
                    NullWallet::new(),
                )
                .await;
            }
        });
        let resolved = directory.resolve().await;
        assert!(resolved.is_ok());
    }
}
