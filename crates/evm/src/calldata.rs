// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! ABI-encoded calldata for the wallet-routed writes. The wallet signs and
//! submits; nothing here ever holds a private key.

use crate::contracts::{ConfidentialZETH, FHEswap, IDOPool, LaunchpadFactory};
use alloy::primitives::{Address, Bytes, B256};
use alloy::sol_types::SolCall;
use anyhow::{anyhow, Result};

/// The handle a public (plaintext) contribution submits in place of a
/// ciphertext.
pub const ZERO_HANDLE: B256 = B256::ZERO;

/// An all-zero ciphertext handle marks state that was never written.
pub fn is_uninitialized_handle(handle: &B256) -> bool {
    handle.is_zero()
}

/// Decode a canonical `0x` hex ciphertext handle into its 32-byte form.
pub fn handle_from_hex(hex: &str) -> Result<B256> {
    hex.parse()
        .map_err(|_| anyhow!("malformed ciphertext handle: {hex}"))
}

/// Decode a canonical `0x` hex input proof.
pub fn proof_from_hex(hex: &str) -> Result<Bytes> {
    hex.parse()
        .map_err(|_| anyhow!("malformed input proof: {hex}"))
}

/// `IDOPool.contribute`. A public contribution passes the zero handle and an
/// empty proof and attaches the amount as transaction value instead.
pub fn contribute_calldata(encrypted_amount: B256, proof: Bytes) -> Vec<u8> {
    IDOPool::contributeCall {
        encryptedAmount: encrypted_amount,
        proof,
        noteParts: Vec::new(),
        noteProofs: Vec::new(),
    }
    .abi_encode()
}

/// `ConfidentialZETH.encryptedApprove`
pub fn encrypted_approve_calldata(spender: Address, encrypted_amount: B256, proof: Bytes) -> Vec<u8> {
    ConfidentialZETH::encryptedApproveCall {
        spender,
        encryptedAmount: encrypted_amount,
        proof,
    }
    .abi_encode()
}

/// `ConfidentialZETH.deposit`; the wrapped amount rides as transaction value.
pub fn deposit_calldata() -> Vec<u8> {
    ConfidentialZETH::depositCall {}.abi_encode()
}

/// `FHEswap.swapToEth`
pub fn swap_to_eth_calldata(encrypted_amount: B256, proof: Bytes) -> Vec<u8> {
    FHEswap::swapToEthCall {
        encryptedAmount: encrypted_amount,
        proof,
    }
    .abi_encode()
}

/// Parameters for `LaunchpadFactory.createAndInitPool`.
#[derive(Debug, Clone)]
pub struct CreatePoolParams {
    pub project_name: String,
    pub price_numerator: u128,
    pub price_denominator: u128,
    pub sale_start: u64,
    pub sale_end: u64,
    pub min_per_address_wei: u64,
    pub max_per_address_wei: u64,
    pub hard_cap_wei: u64,
    pub start_now: bool,
}

pub fn create_pool_calldata(params: &CreatePoolParams) -> Vec<u8> {
    LaunchpadFactory::createAndInitPoolCall {
        projectName: params.project_name.clone(),
        priceNumerator: alloy::primitives::U256::from(params.price_numerator),
        priceDenominator: alloy::primitives::U256::from(params.price_denominator),
        saleStart: params.sale_start,
        saleEnd: params.sale_end,
        minPerAddress: params.min_per_address_wei,
        maxPerAddress: params.max_per_address_wei,
        hardCapWei: params.hard_cap_wei,
        startNow: params.start_now,
    }
    .abi_encode()
}
