// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// An error surfaced by the external SDK. The SDK is a foreign capability
/// module, so all we get is its message.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct SdkError {
    pub message: String,
}

impl SdkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The relayer's complaint when an SDK older than the 0.7 protocol posts
    /// a payload without the `extraData` envelope.
    pub fn is_missing_extra_data(&self) -> bool {
        let msg = self.message.to_lowercase();
        msg.contains("missing field") && msg.contains("extradata")
    }
}

#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("user rejected the request")]
    Rejected,
    #[error("wallet rpc error: {0}")]
    Rpc(String),
}

#[derive(Error, Debug)]
pub enum RelayerError {
    #[error("FHE SDK not found after {attempts} discovery attempts")]
    SdkNotFound { attempts: u32 },
    #[error("Ethereum wallet not found")]
    NoWallet,
    #[error("Wallet address not found")]
    NoWalletAccount,
    #[error("Missing relayer config: set relayer_url and gateway_chain_id")]
    MissingConfig,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("value {0} does not fit in an euint64")]
    ValueOutOfRange(u128),
    #[error(
        "relayer rejected the payload for a missing `extraData` field even in the 0.7 format; \
         the SDK (need >= 0.2.0) and relayer (need 0.7-compatible) versions do not interoperate"
    )]
    ExtraDataRequired,
    #[error("relayer encryption failed: {source}")]
    EncryptionFailed {
        #[source]
        source: SdkError,
    },
    #[error("unsupported ciphertext handle encoding: {0}")]
    UnsupportedHandle(String),
    #[error("unsupported input-proof encoding: {0}")]
    UnsupportedProof(String),
    #[error("decryption result is missing handle {0}")]
    DecryptionResultMissing(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Sdk(#[from] SdkError),
}
