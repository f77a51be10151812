// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;
use zl_evm::ReceiptError;
use zl_relayer::{RelayerError, WalletError};

#[derive(Error, Debug)]
pub enum LaunchpadError {
    #[error(transparent)]
    Relayer(#[from] RelayerError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Receipt(#[from] ReceiptError),
    #[error("chain read failed: {0}")]
    Chain(#[from] anyhow::Error),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("amount does not fit the encryptable 64-bit range")]
    AmountTooLarge,
    #[error("pool has no zETHc token configured")]
    ZethcUnset,
    #[error("no zETHc token address configured")]
    MissingZethc,
    #[error("no swap contract address configured")]
    MissingSwap,
    #[error("no wallet account available")]
    NoAccount,
    #[error("confidential balance is not initialized")]
    BalanceUninitialized,
    #[error("swap transaction emitted no decryption request")]
    MissingRequestId,
    #[error("pool creation transaction emitted no PoolCreated event")]
    PoolEventMissing,
}
