// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Sequences encrypt/approve/submit/receipt steps into complete user flows.
//! Every write is signed by the user's wallet; the orchestrator only builds
//! calldata and waits for results.

use crate::chain::ChainAccess;
use crate::error::LaunchpadError;
use crate::events::{LaunchpadEvent, LocalEventBus};
use crate::flow::{FlowHandle, FlowState};
use alloy::primitives::{Address, Bytes, B256, U256};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use zl_config::AppConfig;
use zl_evm::{
    contribute_calldata, create_pool_calldata, decode_log_events, deposit_calldata,
    encrypted_approve_calldata, handle_from_hex, is_uninitialized_handle, parse_ether,
    proof_from_hex, swap_to_eth_calldata, CreatePoolParams, FHEswap, IDOPool, LaunchpadFactory,
    SwapEvent, ZERO_HANDLE,
};
use zl_relayer::{RelayerManager, TxRequest, WalletProvider};
use zl_store::{Contribution, ProjectStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privacy {
    Public,
    Private,
}

/// Terminal result of a contribution flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionOutcome {
    pub tx_hash: B256,
    /// Actor as emitted on-chain, falling back to the local account
    pub user: Address,
    /// Plaintext amount; only known for public contributions
    pub amount_wei: Option<U256>,
}

/// Terminal result of a swap-to-ETH flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    Completed { amount_wei: U256 },
    Failed { reason: String },
    /// The settlement polling budget ran out; the request is still in flight.
    Pending { request_id: U256 },
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub zethc_address: Option<Address>,
    pub swap_address: Option<Address>,
    pub swap_poll_attempts: u32,
    pub swap_poll_interval: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            zethc_address: None,
            swap_address: None,
            swap_poll_attempts: 120,
            swap_poll_interval: Duration::from_secs(3),
        }
    }
}

impl From<&AppConfig> for OrchestratorOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            zethc_address: config.zethc_address,
            swap_address: config.swap_address,
            swap_poll_attempts: config.oracle.poll_attempts,
            swap_poll_interval: Duration::from_millis(config.oracle.poll_interval_ms),
        }
    }
}

pub struct Orchestrator {
    relayer: Arc<RelayerManager>,
    chain: Arc<dyn ChainAccess>,
    store: Arc<dyn ProjectStore>,
    bus: LocalEventBus,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(
        relayer: Arc<RelayerManager>,
        chain: Arc<dyn ChainAccess>,
        store: Arc<dyn ProjectStore>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            relayer,
            chain,
            store,
            bus: LocalEventBus::new(),
            options,
        }
    }

    pub fn events(&self) -> &LocalEventBus {
        &self.bus
    }

    /// Contribute `amount_eth` to `pool`, privately (encrypted zETHc path,
    /// approval first) or publicly (plaintext ETH value).
    pub async fn contribute(
        &self,
        flow: &FlowHandle,
        pool: Address,
        amount_eth: &str,
        privacy: Privacy,
    ) -> Result<ContributionOutcome, LaunchpadError> {
        let result = self.contribute_inner(flow, pool, amount_eth, privacy).await;
        self.finish(flow, result)
    }

    /// Swap `amount_wei` of confidential zETHc back to ETH. Terminates with
    /// `Pending` if the settlement does not land within the polling budget.
    pub async fn swap_to_eth(
        &self,
        flow: &FlowHandle,
        amount_wei: u128,
    ) -> Result<SwapOutcome, LaunchpadError> {
        let result = self.swap_inner(flow, amount_wei).await;
        self.finish(flow, result)
    }

    /// Wrap plain ETH into confidential zETHc.
    pub async fn wrap_eth(
        &self,
        flow: &FlowHandle,
        amount_eth: &str,
    ) -> Result<B256, LaunchpadError> {
        let result = self.wrap_inner(flow, amount_eth).await;
        self.finish(flow, result)
    }

    /// Create and initialize a pool through the factory, returning the new
    /// pool's address from the creation event.
    pub async fn create_pool(
        &self,
        flow: &FlowHandle,
        factory: Address,
        params: CreatePoolParams,
    ) -> Result<Address, LaunchpadError> {
        let result = self.create_pool_inner(flow, factory, params).await;
        self.finish(flow, result)
    }

    /// Decrypt the caller's confidential zETHc balance held by `pool`'s
    /// token. One wallet signature; the plaintext is never persisted.
    pub async fn check_private_balance(&self, pool: Address) -> Result<u64, LaunchpadError> {
        let (_, user) = self.active_account().await?;
        let zethc = self.chain.pool_zethc(pool).await?;
        if zethc.is_zero() {
            return Err(LaunchpadError::ZethcUnset);
        }
        let handle = self.chain.encrypted_balance_of(zethc, user).await?;
        if is_uninitialized_handle(&handle) {
            return Err(LaunchpadError::BalanceUninitialized);
        }
        let value = self
            .relayer
            .user_decrypt_uint64(&zethc.to_checksum(None), &handle.to_string())
            .await?;
        Ok(value)
    }

    /// Decrypt the caller's confidential contribution total in `pool`.
    /// An all-zero handle means nothing was contributed yet.
    pub async fn my_contribution(&self, pool: Address) -> Result<u64, LaunchpadError> {
        let (_, user) = self.active_account().await?;
        let handle = self.chain.encrypted_contribution_of(pool, user).await?;
        if is_uninitialized_handle(&handle) {
            return Ok(0);
        }
        let value = self
            .relayer
            .user_decrypt_uint64(&pool.to_checksum(None), &handle.to_string())
            .await?;
        Ok(value)
    }

    async fn contribute_inner(
        &self,
        flow: &FlowHandle,
        pool: Address,
        amount_eth: &str,
        privacy: Privacy,
    ) -> Result<ContributionOutcome, LaunchpadError> {
        let value_wei =
            parse_ether(amount_eth).map_err(|err| LaunchpadError::InvalidAmount(err.to_string()))?;
        if value_wei.is_zero() {
            return Err(LaunchpadError::InvalidAmount(
                "amount must be positive".into(),
            ));
        }
        let (wallet, user) = self.active_account().await?;

        match privacy {
            Privacy::Private => {
                let value_u64: u64 = value_wei
                    .try_into()
                    .map_err(|_| LaunchpadError::AmountTooLarge)?;

                flow.set(FlowState::Approving);
                let zethc = self.chain.pool_zethc(pool).await?;
                if zethc.is_zero() {
                    return Err(LaunchpadError::ZethcUnset);
                }

                // Blanket allowance, so one approval covers later top-ups.
                let approval = self
                    .relayer
                    .encrypt_uint64(
                        &zethc.to_checksum(None),
                        &user.to_checksum(None),
                        u128::from(u64::MAX),
                        "encryptedApprove",
                    )
                    .await?;
                let data = encrypted_approve_calldata(
                    pool,
                    handle_from_hex(&approval.data)?,
                    proof_from_hex(&approval.proof)?,
                );
                let approve_tx = wallet
                    .send_transaction(TxRequest {
                        from: user,
                        to: zethc,
                        value: U256::ZERO,
                        data,
                    })
                    .await?;

                // The approval must mine before the contribution is built,
                // or the pool's transferFrom reverts.
                flow.set(FlowState::AwaitingReceipt);
                self.chain.wait_for_receipt(approve_tx).await?;
                debug!(%pool, %approve_tx, "approval mined");

                flow.set(FlowState::Submitting);
                let encrypted = self
                    .relayer
                    .encrypt_uint64(
                        &pool.to_checksum(None),
                        &user.to_checksum(None),
                        u128::from(value_u64),
                        "contribute",
                    )
                    .await?;
                let data = contribute_calldata(
                    handle_from_hex(&encrypted.data)?,
                    proof_from_hex(&encrypted.proof)?,
                );
                let tx = wallet
                    .send_transaction(TxRequest {
                        from: user,
                        to: pool,
                        value: U256::ZERO,
                        data,
                    })
                    .await?;

                flow.set(FlowState::AwaitingReceipt);
                let receipt = self.chain.wait_for_receipt(tx).await?;
                let actor = decode_log_events::<IDOPool::ContributedZethc>(&receipt.logs)
                    .first()
                    .map(|event| event.user)
                    .unwrap_or(user);

                info!(%pool, user = %actor, tx = %receipt.tx_hash, "private contribution mined");
                self.announce_contribution(pool, actor, true, None, receipt.tx_hash)
                    .await;
                Ok(ContributionOutcome {
                    tx_hash: receipt.tx_hash,
                    user: actor,
                    amount_wei: None,
                })
            }
            Privacy::Public => {
                flow.set(FlowState::Submitting);
                let data = contribute_calldata(ZERO_HANDLE, Bytes::new());
                let tx = wallet
                    .send_transaction(TxRequest {
                        from: user,
                        to: pool,
                        value: value_wei,
                        data,
                    })
                    .await?;

                flow.set(FlowState::AwaitingReceipt);
                let receipt = self.chain.wait_for_receipt(tx).await?;
                let event = decode_log_events::<IDOPool::ContributedEth>(&receipt.logs)
                    .into_iter()
                    .next();
                let actor = event.as_ref().map(|e| e.user).unwrap_or(user);
                let amount = event.map(|e| e.amountWei).unwrap_or(value_wei);

                info!(%pool, user = %actor, tx = %receipt.tx_hash, "public contribution mined");
                self.announce_contribution(pool, actor, false, Some(amount), receipt.tx_hash)
                    .await;
                Ok(ContributionOutcome {
                    tx_hash: receipt.tx_hash,
                    user: actor,
                    amount_wei: Some(amount),
                })
            }
        }
    }

    async fn swap_inner(
        &self,
        flow: &FlowHandle,
        amount_wei: u128,
    ) -> Result<SwapOutcome, LaunchpadError> {
        let swap = self.options.swap_address.ok_or(LaunchpadError::MissingSwap)?;
        let (wallet, user) = self.active_account().await?;

        flow.set(FlowState::Approving);
        let zethc = self.chain.swap_zethc(swap).await?;
        if zethc.is_zero() {
            return Err(LaunchpadError::ZethcUnset);
        }

        // Exact allowance here: the swap consumes the full approved amount.
        let approval = self
            .relayer
            .encrypt_uint64(
                &zethc.to_checksum(None),
                &user.to_checksum(None),
                amount_wei,
                "encryptedApprove",
            )
            .await?;
        let data = encrypted_approve_calldata(
            swap,
            handle_from_hex(&approval.data)?,
            proof_from_hex(&approval.proof)?,
        );
        let approve_tx = wallet
            .send_transaction(TxRequest {
                from: user,
                to: zethc,
                value: U256::ZERO,
                data,
            })
            .await?;
        flow.set(FlowState::AwaitingReceipt);
        self.chain.wait_for_receipt(approve_tx).await?;

        flow.set(FlowState::Submitting);
        let encrypted = self
            .relayer
            .encrypt_uint64(
                &swap.to_checksum(None),
                &user.to_checksum(None),
                amount_wei,
                "swapToEth",
            )
            .await?;
        let data = swap_to_eth_calldata(
            handle_from_hex(&encrypted.data)?,
            proof_from_hex(&encrypted.proof)?,
        );
        let tx = wallet
            .send_transaction(TxRequest {
                from: user,
                to: swap,
                value: U256::ZERO,
                data,
            })
            .await?;

        flow.set(FlowState::AwaitingReceipt);
        let receipt = self.chain.wait_for_receipt(tx).await?;
        let requests = decode_log_events::<FHEswap::SwapDecryptRequested>(&receipt.logs);
        let request_id = requests
            .iter()
            .find(|event| event.user == user)
            .or_else(|| requests.first())
            .map(|event| event.requestId)
            .ok_or(LaunchpadError::MissingRequestId)?;
        info!(%swap, %request_id, tx = %receipt.tx_hash, "swap decryption requested");

        for attempt in 0..self.options.swap_poll_attempts {
            match self
                .chain
                .swap_settlement_since(swap, user, receipt.block_number)
                .await?
            {
                Some(SwapEvent::Completed { amount_wei }) => {
                    self.bus.publish(LaunchpadEvent::SwapSettled {
                        user,
                        ok: true,
                        reason: None,
                    });
                    return Ok(SwapOutcome::Completed { amount_wei });
                }
                Some(SwapEvent::Failed { reason }) => {
                    self.bus.publish(LaunchpadEvent::SwapSettled {
                        user,
                        ok: false,
                        reason: Some(reason.clone()),
                    });
                    return Ok(SwapOutcome::Failed { reason });
                }
                None => {
                    debug!(%request_id, attempt, "swap not settled yet");
                }
            }
            if attempt + 1 < self.options.swap_poll_attempts {
                sleep(self.options.swap_poll_interval).await;
            }
        }
        Ok(SwapOutcome::Pending { request_id })
    }

    async fn wrap_inner(
        &self,
        flow: &FlowHandle,
        amount_eth: &str,
    ) -> Result<B256, LaunchpadError> {
        let value_wei =
            parse_ether(amount_eth).map_err(|err| LaunchpadError::InvalidAmount(err.to_string()))?;
        if value_wei.is_zero() {
            return Err(LaunchpadError::InvalidAmount(
                "amount must be positive".into(),
            ));
        }
        let zethc = self.options.zethc_address.ok_or(LaunchpadError::MissingZethc)?;
        let (wallet, user) = self.active_account().await?;

        flow.set(FlowState::Submitting);
        let tx = wallet
            .send_transaction(TxRequest {
                from: user,
                to: zethc,
                value: value_wei,
                data: deposit_calldata(),
            })
            .await?;
        flow.set(FlowState::AwaitingReceipt);
        let receipt = self.chain.wait_for_receipt(tx).await?;
        Ok(receipt.tx_hash)
    }

    async fn create_pool_inner(
        &self,
        flow: &FlowHandle,
        factory: Address,
        params: CreatePoolParams,
    ) -> Result<Address, LaunchpadError> {
        let (wallet, user) = self.active_account().await?;

        flow.set(FlowState::Submitting);
        let tx = wallet
            .send_transaction(TxRequest {
                from: user,
                to: factory,
                value: U256::ZERO,
                data: create_pool_calldata(&params),
            })
            .await?;
        flow.set(FlowState::AwaitingReceipt);
        let receipt = self.chain.wait_for_receipt(tx).await?;

        // Several pools can be created in one block; the newest is ours.
        decode_log_events::<LaunchpadFactory::PoolCreated>(&receipt.logs)
            .into_iter()
            .last()
            .map(|event| event.pool)
            .ok_or(LaunchpadError::PoolEventMissing)
    }

    async fn active_account(
        &self,
    ) -> Result<(Arc<dyn WalletProvider>, Address), LaunchpadError> {
        let wallet = self.relayer.wallets().resolve().await?;
        let accounts = wallet.request_accounts().await?;
        let user = accounts.first().copied().ok_or(LaunchpadError::NoAccount)?;
        Ok((wallet, user))
    }

    /// Broadcast the local event and persist a best-effort audit record. A
    /// store failure is logged and never fails the flow.
    async fn announce_contribution(
        &self,
        pool: Address,
        user: Address,
        is_private: bool,
        amount_wei: Option<U256>,
        tx_hash: B256,
    ) {
        self.bus.publish(LaunchpadEvent::NewContribution {
            pool,
            user,
            is_private,
            amount_wei,
            tx: tx_hash,
        });

        let record = Contribution {
            user: user.to_checksum(None),
            is_private,
            amount_wei: amount_wei.map(|amount| amount.to_string()),
            tx: Some(tx_hash.to_string()),
            timestamp: unix_now_millis(),
        };
        if let Err(err) = self
            .store
            .append_contribution(&pool.to_checksum(None), record)
            .await
        {
            warn!(%pool, error = %err, "could not persist contribution record");
        }
    }

    fn finish<T>(
        &self,
        flow: &FlowHandle,
        result: Result<T, LaunchpadError>,
    ) -> Result<T, LaunchpadError> {
        match result {
            Ok(value) => {
                flow.set(FlowState::Success);
                Ok(value)
            }
            Err(err) => {
                flow.set(FlowState::Failed(err.to_string()));
                Err(err)
            }
        }
    }
}

fn unix_now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
