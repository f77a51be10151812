// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Chain access surface for the orchestrators: the handful of reads and the
//! receipt wait they need, behind a trait so flows can be exercised without
//! an RPC endpoint.

use alloy::primitives::{Address, Log, B256};
use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Duration;
use zl_config::RPC;
use zl_evm::{
    wait_for_receipt, LaunchContractFactory, PoolRead, ReceiptError, SwapEvent, SwapRead,
    ZethcRead, DEFAULT_RECEIPT_TIMEOUT,
};

/// The slice of a mined receipt the orchestrators consume.
#[derive(Debug, Clone)]
pub struct ReceiptSummary {
    pub tx_hash: B256,
    pub block_number: u64,
    pub logs: Vec<Log>,
}

#[async_trait]
pub trait ChainAccess: Send + Sync {
    /// `IDOPool.zethc()`
    async fn pool_zethc(&self, pool: Address) -> Result<Address>;

    /// `FHEswap.zethc()`
    async fn swap_zethc(&self, swap: Address) -> Result<Address>;

    /// `ConfidentialZETH.encryptedBalanceOf(owner)`
    async fn encrypted_balance_of(&self, zethc: Address, owner: Address) -> Result<B256>;

    /// `IDOPool.encryptedUserContrib(user)`
    async fn encrypted_contribution_of(&self, pool: Address, user: Address) -> Result<B256>;

    /// Wait for `tx_hash` to mine, within the configured deadline.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptSummary, ReceiptError>;

    /// Scan for a swap settlement for `user` from `from_block` onward.
    async fn swap_settlement_since(
        &self,
        swap: Address,
        user: Address,
        from_block: u64,
    ) -> Result<Option<SwapEvent>>;
}

/// Production chain access over one read-only RPC provider.
pub struct EvmChain {
    contracts: LaunchContractFactory,
    receipt_timeout: Duration,
}

impl EvmChain {
    /// Scheme and host are validated before any provider is built; a
    /// websocket URL is converted to its http(s) equivalent.
    pub async fn connect(rpc_url: &str) -> Result<Self> {
        let rpc = RPC::from_url(rpc_url)?;
        Ok(Self {
            contracts: LaunchContractFactory::connect(&rpc.as_http_url()?).await?,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        })
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    pub fn contracts(&self) -> &LaunchContractFactory {
        &self.contracts
    }
}

#[async_trait]
impl ChainAccess for EvmChain {
    async fn pool_zethc(&self, pool: Address) -> Result<Address> {
        self.contracts.pool(pool).zethc().await
    }

    async fn swap_zethc(&self, swap: Address) -> Result<Address> {
        self.contracts.swap(swap).zethc().await
    }

    async fn encrypted_balance_of(&self, zethc: Address, owner: Address) -> Result<B256> {
        self.contracts.zethc(zethc).encrypted_balance_of(owner).await
    }

    async fn encrypted_contribution_of(&self, pool: Address, user: Address) -> Result<B256> {
        self.contracts
            .pool(pool)
            .encrypted_contribution_of(user)
            .await
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptSummary, ReceiptError> {
        let provider = self.contracts.provider();
        let receipt = wait_for_receipt(&*provider, tx_hash, self.receipt_timeout).await?;
        Ok(ReceiptSummary {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }

    async fn swap_settlement_since(
        &self,
        swap: Address,
        user: Address,
        from_block: u64,
    ) -> Result<Option<SwapEvent>> {
        self.contracts
            .swap(swap)
            .settlement_since(user, from_block)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_rejects_malformed_rpc_urls() {
        assert!(EvmChain::connect("ftp://rpc.example.com").await.is_err());
        assert!(EvmChain::connect("not a url").await.is_err());
    }
}
