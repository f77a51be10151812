// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    primitives::{Address, B256, U256},
    providers::fillers::{
        BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
    },
    providers::{Identity, Provider, ProviderBuilder, RootProvider},
    sol,
};
use anyhow::Result;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    contract IDOPool {
        function zethc() external view returns (address);
        function hardCapPublic() external view returns (uint64);
        function raisedEthPublic() external view returns (uint256);
        function saleStart() external view returns (uint64);
        function saleEnd() external view returns (uint64);
        function finalized() external view returns (bool);
        function projectName() external view returns (string);
        function encryptedUserContrib(address user) external view returns (bytes32);
        function contribute(bytes32 encryptedAmount, bytes proof, bytes32[] noteParts, bytes[] noteProofs) external payable returns (bytes32 movedE);
        event ContributedEth(address indexed user, uint256 amountWei);
        event ContributedZethc(address indexed user);
        event Finalized(uint256 saleSupplyAtEnd);
    }

    #[derive(Debug)]
    #[sol(rpc)]
    contract LaunchpadFactory {
        function createAndInitPool(string projectName, uint256 priceNumerator, uint256 priceDenominator, uint64 saleStart, uint64 saleEnd, uint64 minPerAddress, uint64 maxPerAddress, uint64 hardCapWei, bool startNow) external returns (address pool);
        function allPoolsLength() external view returns (uint256);
        function allPools(uint256 index) external view returns (address);
        function poolsOf(address creator) external view returns (address[] pools);
        event PoolCreated(address indexed creator, address pool, address zeth, string projectName, address saleToken);
    }

    #[derive(Debug)]
    #[sol(rpc)]
    contract ConfidentialZETH {
        function deposit() external payable;
        function encryptedApprove(address spender, bytes32 encryptedAmount, bytes proof) external;
        function encryptedBalanceOf(address owner) external view returns (bytes32);
        function balanceOf(address owner) external view returns (bytes32);
    }

    #[derive(Debug)]
    #[sol(rpc)]
    contract FHEswap {
        function zethc() external view returns (address);
        function swapToEth(bytes32 encryptedAmount, bytes proof) external;
        event SwapDecryptRequested(address indexed user, uint256 requestId);
        event SwapToEth(address indexed user, uint256 amountWei);
        event SwapFailed(address indexed user, string reason);
    }
}

/// Public sale parameters of a pool, read in one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    pub project_name: String,
    pub hard_cap_wei: u64,
    pub raised_wei: U256,
    pub sale_start: u64,
    pub sale_end: u64,
    pub finalized: bool,
}

/// A swap settlement observed on-chain for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapEvent {
    Completed { amount_wei: U256 },
    Failed { reason: String },
}

/// Trait for read-only operations on an IDOPool
#[async_trait]
pub trait PoolRead {
    /// The zETHc token the pool accepts private contributions in
    async fn zethc(&self) -> Result<Address>;

    /// Public sale parameters and progress
    async fn status(&self) -> Result<PoolStatus>;

    /// Ciphertext handle of a user's confidential contribution total
    async fn encrypted_contribution_of(&self, user: Address) -> Result<B256>;
}

/// Trait for read-only operations on the ConfidentialZETH token
#[async_trait]
pub trait ZethcRead {
    /// Ciphertext handle of an account's confidential balance
    async fn encrypted_balance_of(&self, owner: Address) -> Result<B256>;
}

/// Trait for read-only operations on the FHEswap contract
#[async_trait]
pub trait SwapRead {
    /// The zETHc token the swap settles from
    async fn zethc(&self) -> Result<Address>;

    /// Scan for a settlement event for `user` from `from_block` onward
    async fn settlement_since(&self, user: Address, from_block: u64)
        -> Result<Option<SwapEvent>>;
}

/// Trait for read-only operations on the LaunchpadFactory
#[async_trait]
pub trait FactoryRead {
    async fn pool_count(&self) -> Result<U256>;
    async fn pools_of(&self, creator: Address) -> Result<Vec<Address>>;
}

/// Generic type to represent different provider types
pub trait ProviderType: Send {
    type Provider: Provider + Send + Sync + 'static;
}

/// Marker type for read-only provider. Writes never take this path: they are
/// ABI-encoded locally and routed through the user's wallet for signing.
#[derive(Clone)]
pub struct ReadOnly;
impl ProviderType for ReadOnly {
    type Provider = LaunchReadOnlyProvider;
}

/// Type alias for the read-only provider
pub type LaunchReadOnlyProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Generic pool contract handle
#[derive(Clone)]
pub struct PoolContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    _marker: PhantomData<T>,
}

#[derive(Clone)]
pub struct ZethcContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    _marker: PhantomData<T>,
}

#[derive(Clone)]
pub struct SwapContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    _marker: PhantomData<T>,
}

#[derive(Clone)]
pub struct FactoryContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    _marker: PhantomData<T>,
}

/// Type aliases for the read-only contract variants
pub type PoolReadContract = PoolContract<ReadOnly>;
pub type ZethcReadContract = ZethcContract<ReadOnly>;
pub type SwapReadContract = SwapContract<ReadOnly>;
pub type FactoryReadContract = FactoryContract<ReadOnly>;

// Factory for creating contract instances over one shared provider
pub struct LaunchContractFactory {
    provider: Arc<LaunchReadOnlyProvider>,
}

impl LaunchContractFactory {
    /// Connect a read-only provider to the given HTTP RPC endpoint.
    pub async fn connect(http_rpc_url: &str) -> Result<Self> {
        let provider = ProviderBuilder::new().connect(http_rpc_url).await?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    pub fn provider(&self) -> Arc<LaunchReadOnlyProvider> {
        self.provider.clone()
    }

    pub fn pool(&self, contract_address: Address) -> PoolReadContract {
        PoolContract {
            provider: self.provider.clone(),
            contract_address,
            _marker: PhantomData,
        }
    }

    pub fn zethc(&self, contract_address: Address) -> ZethcReadContract {
        ZethcContract {
            provider: self.provider.clone(),
            contract_address,
            _marker: PhantomData,
        }
    }

    pub fn swap(&self, contract_address: Address) -> SwapReadContract {
        SwapContract {
            provider: self.provider.clone(),
            contract_address,
            _marker: PhantomData,
        }
    }

    pub fn launchpad_factory(&self, contract_address: Address) -> FactoryReadContract {
        FactoryContract {
            provider: self.provider.clone(),
            contract_address,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Send + Sync> PoolRead for PoolContract<T>
where
    T: ProviderType,
{
    async fn zethc(&self) -> Result<Address> {
        let contract = IDOPool::new(self.contract_address, &self.provider);
        let zethc = contract.zethc().call().await?;
        Ok(zethc)
    }

    async fn status(&self) -> Result<PoolStatus> {
        let contract = IDOPool::new(self.contract_address, &self.provider);
        let project_name = contract.projectName().call().await?;
        let hard_cap_wei = contract.hardCapPublic().call().await?;
        let raised_wei = contract.raisedEthPublic().call().await?;
        let sale_start = contract.saleStart().call().await?;
        let sale_end = contract.saleEnd().call().await?;
        let finalized = contract.finalized().call().await?;
        Ok(PoolStatus {
            project_name,
            hard_cap_wei,
            raised_wei,
            sale_start,
            sale_end,
            finalized,
        })
    }

    async fn encrypted_contribution_of(&self, user: Address) -> Result<B256> {
        let contract = IDOPool::new(self.contract_address, &self.provider);
        let handle = contract.encryptedUserContrib(user).call().await?;
        Ok(handle)
    }
}

#[async_trait]
impl<T: Send + Sync> ZethcRead for ZethcContract<T>
where
    T: ProviderType,
{
    async fn encrypted_balance_of(&self, owner: Address) -> Result<B256> {
        let contract = ConfidentialZETH::new(self.contract_address, &self.provider);
        let handle = contract.encryptedBalanceOf(owner).call().await?;
        Ok(handle)
    }
}

#[async_trait]
impl<T: Send + Sync> SwapRead for SwapContract<T>
where
    T: ProviderType,
{
    async fn zethc(&self) -> Result<Address> {
        let contract = FHEswap::new(self.contract_address, &self.provider);
        let zethc = contract.zethc().call().await?;
        Ok(zethc)
    }

    async fn settlement_since(
        &self,
        user: Address,
        from_block: u64,
    ) -> Result<Option<SwapEvent>> {
        let contract = FHEswap::new(self.contract_address, &self.provider);

        let completed = contract
            .SwapToEth_filter()
            .from_block(from_block)
            .query()
            .await?;
        if let Some((event, _)) = completed.iter().find(|(event, _)| event.user == user) {
            return Ok(Some(SwapEvent::Completed {
                amount_wei: event.amountWei,
            }));
        }

        let failed = contract
            .SwapFailed_filter()
            .from_block(from_block)
            .query()
            .await?;
        if let Some((event, _)) = failed.iter().find(|(event, _)| event.user == user) {
            return Ok(Some(SwapEvent::Failed {
                reason: event.reason.clone(),
            }));
        }

        Ok(None)
    }
}

#[async_trait]
impl<T: Send + Sync> FactoryRead for FactoryContract<T>
where
    T: ProviderType,
{
    async fn pool_count(&self) -> Result<U256> {
        let contract = LaunchpadFactory::new(self.contract_address, &self.provider);
        let count = contract.allPoolsLength().call().await?;
        Ok(count)
    }

    async fn pools_of(&self, creator: Address) -> Result<Vec<Address>> {
        let contract = LaunchpadFactory::new(self.contract_address, &self.provider);
        let pools = contract.poolsOf(creator).call().await?;
        Ok(pools)
    }
}
