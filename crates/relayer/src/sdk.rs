// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Capability traits modeling the externally hosted FHE SDK, plus the
//! registry the hosting environment registers its module into.

use crate::error::SdkError;
use crate::wallet::WalletProvider;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ephemeral keypair used to scope one user-decryption request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair {
    pub public_key: String,
    pub private_key: String,
}

/// EIP-712 typed-data document produced by the SDK for a decryption
/// authorization.
#[derive(Debug, Clone)]
pub struct Eip712Document {
    pub domain: Value,
    pub types: Value,
    pub primary_type: String,
    pub message: Value,
}

impl Eip712Document {
    /// The JSON body handed to `eth_signTypedData_v4`.
    pub fn to_sign_payload(&self) -> Value {
        json!({
            "types": self.types,
            "domain": self.domain,
            "primaryType": self.primary_type,
            "message": self.message,
        })
    }
}

/// A byte-string coming back from the SDK. The SDK returns either raw bytes
/// or an already hex-encoded string depending on its version; this closed set
/// replaces sniffing the value's runtime shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkBytes {
    Hex(String),
    Bytes(Vec<u8>),
}

impl SdkBytes {
    /// Normalize to canonical `0x`-prefixed lowercase even-length hex.
    /// Idempotent: normalizing an already canonical value is a no-op.
    pub fn to_canonical_hex(&self) -> Result<String, String> {
        match self {
            SdkBytes::Bytes(bytes) => Ok(format!("0x{}", hex::encode(bytes))),
            SdkBytes::Hex(s) => {
                let digits = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                if digits.len() % 2 != 0 {
                    return Err(format!("odd-length hex string ({} digits)", digits.len()));
                }
                if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(format!("non-hex characters in {s:?}"));
                }
                Ok(format!("0x{}", digits.to_lowercase()))
            }
        }
    }
}

/// Audit envelope describing the intended call, sent alongside the input
/// proof so the relayer can validate the call shape (0.7 protocol).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtraData {
    pub chain_id: u64,
    pub gateway_chain_id: u64,
    pub contract_address: String,
    pub user_address: String,
    pub function: String,
    pub arg_types: Vec<String>,
}

/// What the SDK's terminal encrypt operation yields before normalization.
#[derive(Debug, Clone)]
pub struct RawEncryptedPayload {
    pub handles: Vec<SdkBytes>,
    pub input_proof: SdkBytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleContractPair {
    pub handle: String,
    pub contract_address: String,
}

/// Everything the relayer needs to serve one authorized decryption batch.
#[derive(Debug, Clone)]
pub struct UserDecryptRequest {
    pub pairs: Vec<HandleContractPair>,
    pub private_key: String,
    pub public_key: String,
    /// Raw-hex signature, `0x` prefix already stripped
    pub signature_no_0x: String,
    pub contract_addresses: Vec<String>,
    pub signer_address: String,
    pub start_timestamp_sec: u64,
    pub duration_days: u64,
}

/// Parameters for building a configured SDK instance.
#[derive(Clone)]
pub struct InstanceConfig {
    /// The wallet's transport doubles as the network handle
    pub network: Arc<dyn WalletProvider>,
    pub relayer_url: String,
    pub gateway_chain_id: u64,
    /// Preset network identifier, e.g. "sepolia"
    pub preset: String,
}

/// Single-use builder accumulating typed values for one (contract, user)
/// scope. Only 64-bit unsigned values are used by this system.
#[async_trait]
pub trait EncryptedInputBuilder: Send {
    fn add64(&mut self, value: u64);
    async fn encrypt(
        self: Box<Self>,
        extra_data: Option<ExtraData>,
    ) -> Result<RawEncryptedPayload, SdkError>;
}

/// A configured SDK session bound to one relayer/gateway configuration.
#[async_trait]
pub trait FhevmInstance: Send + Sync {
    fn generate_keypair(&self) -> Keypair;

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[String],
        start_timestamp_sec: u64,
        duration_days: u64,
    ) -> Eip712Document;

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<String, String>, SdkError>;

    fn create_encrypted_input(
        &self,
        contract_address: &str,
        user_address: &str,
    ) -> Box<dyn EncryptedInputBuilder>;
}

/// The externally supplied FHE capability module.
#[async_trait]
pub trait FhevmSdk: Send + Sync {
    fn version(&self) -> Option<String> {
        None
    }

    /// The SDK's own initialization entry point. Called exactly once per
    /// session by the manager.
    async fn init(&self) -> Result<(), SdkError>;

    async fn create_instance(
        &self,
        config: InstanceConfig,
    ) -> Result<Arc<dyn FhevmInstance>, SdkError>;
}

/// Named slots the hosting environment registers SDK modules into. Replaces
/// ambient global lookup: discovery only ever consults this registry.
#[derive(Default)]
pub struct SdkRegistry {
    slots: RwLock<HashMap<String, Arc<dyn FhevmSdk>>>,
}

impl SdkRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn register(&self, name: &str, sdk: Arc<dyn FhevmSdk>) {
        self.slots.write().await.insert(name.to_string(), sdk);
    }

    pub async fn lookup(&self, name: &str) -> Option<Arc<dyn FhevmSdk>> {
        self.slots.read().await.get(name).cloned()
    }
}
