// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Scriptable stand-in for the externally hosted FHE SDK.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zl_relayer::{
    Eip712Document, EncryptedInputBuilder, ExtraData, FhevmInstance, FhevmSdk, HandleContractPair,
    InstanceConfig, Keypair, RawEncryptedPayload, SdkBytes, SdkError, UserDecryptRequest,
};

/// Which shape the mock returns encrypt results in. Real SDK versions differ
/// here, which is exactly what the normalization layer papers over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    RawBytes,
    HexStrings,
}

#[derive(Default)]
struct EncryptScript {
    /// Fail the first (extraData) attempt with this message
    fail_with_extra_data: Option<String>,
    /// Fail every attempt with this message
    fail_always: Option<String>,
}

#[derive(Default)]
pub struct MockInstanceState {
    keypair_counter: AtomicU64,
    encrypt_script: Mutex<EncryptScript>,
    shape: Mutex<Option<PayloadShape>>,
    /// extraData passed to each terminal encrypt call, in order
    pub encrypt_envelopes: Mutex<Vec<Option<ExtraData>>>,
    pub decrypt_requests: Mutex<Vec<UserDecryptRequest>>,
    decrypt_results: Mutex<HashMap<String, String>>,
}

pub struct MockInstance {
    pub id: usize,
    state: Arc<MockInstanceState>,
}

impl MockInstance {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            state: Arc::new(MockInstanceState::default()),
        }
    }

    pub fn state(&self) -> Arc<MockInstanceState> {
        self.state.clone()
    }
}

impl MockInstanceState {
    pub fn fail_extra_data_attempt(&self, message: &str) {
        self.encrypt_script.lock().unwrap().fail_with_extra_data = Some(message.to_string());
    }

    pub fn fail_every_attempt(&self, message: &str) {
        self.encrypt_script.lock().unwrap().fail_always = Some(message.to_string());
    }

    pub fn return_shape(&self, shape: PayloadShape) {
        *self.shape.lock().unwrap() = Some(shape);
    }

    pub fn set_decrypt_result(&self, handle: &str, plaintext: &str) {
        self.decrypt_results
            .lock()
            .unwrap()
            .insert(handle.to_string(), plaintext.to_string());
    }

    pub fn envelopes_seen(&self) -> Vec<Option<ExtraData>> {
        self.encrypt_envelopes.lock().unwrap().clone()
    }
}

struct MockInputBuilder {
    contract: String,
    user: String,
    values: Vec<u64>,
    state: Arc<MockInstanceState>,
}

#[async_trait]
impl EncryptedInputBuilder for MockInputBuilder {
    fn add64(&mut self, value: u64) {
        self.values.push(value);
    }

    async fn encrypt(
        self: Box<Self>,
        extra_data: Option<ExtraData>,
    ) -> Result<RawEncryptedPayload, SdkError> {
        let with_envelope = extra_data.is_some();
        self.state
            .encrypt_envelopes
            .lock()
            .unwrap()
            .push(extra_data);

        {
            let script = self.state.encrypt_script.lock().unwrap();
            if let Some(message) = &script.fail_always {
                return Err(SdkError::new(message.clone()));
            }
            if with_envelope {
                if let Some(message) = &script.fail_with_extra_data {
                    return Err(SdkError::new(message.clone()));
                }
            }
        }

        // Deterministic "ciphertext": the scope and value hashed into bytes.
        let seed = format!(
            "{}|{}|{:?}",
            self.contract.to_lowercase(),
            self.user.to_lowercase(),
            self.values
        );
        let digest: Vec<u8> = seed.bytes().rev().take(32).collect();
        let proof: Vec<u8> = seed.into_bytes();

        let shape = self
            .state
            .shape
            .lock()
            .unwrap()
            .unwrap_or(PayloadShape::HexStrings);
        let payload = match shape {
            PayloadShape::RawBytes => RawEncryptedPayload {
                handles: vec![SdkBytes::Bytes(digest)],
                input_proof: SdkBytes::Bytes(proof),
            },
            PayloadShape::HexStrings => RawEncryptedPayload {
                // Deliberately unprefixed uppercase hex: normalization input
                handles: vec![SdkBytes::Hex(hex::encode_upper(digest))],
                input_proof: SdkBytes::Hex(format!("0x{}", hex::encode(proof))),
            },
        };
        Ok(payload)
    }
}

#[async_trait]
impl FhevmInstance for MockInstance {
    fn generate_keypair(&self) -> Keypair {
        let n = self.state.keypair_counter.fetch_add(1, Ordering::SeqCst);
        Keypair {
            public_key: format!("0xpub{:02}{:04}", self.id, n),
            private_key: format!("0xprv{:02}{:04}", self.id, n),
        }
    }

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[String],
        start_timestamp_sec: u64,
        duration_days: u64,
    ) -> Eip712Document {
        Eip712Document {
            domain: json!({ "name": "Decryption", "version": "1" }),
            types: json!({
                "UserDecryptRequestVerification": [
                    { "name": "publicKey", "type": "bytes" },
                    { "name": "contractAddresses", "type": "address[]" },
                    { "name": "startTimestamp", "type": "uint256" },
                    { "name": "durationDays", "type": "uint256" },
                ],
            }),
            primary_type: "UserDecryptRequestVerification".to_string(),
            message: json!({
                "publicKey": public_key,
                "contractAddresses": contract_addresses,
                "startTimestamp": start_timestamp_sec.to_string(),
                "durationDays": duration_days.to_string(),
            }),
        }
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<String, String>, SdkError> {
        let pairs: Vec<HandleContractPair> = request.pairs.clone();
        self.state.decrypt_requests.lock().unwrap().push(request);
        let results = self.state.decrypt_results.lock().unwrap();
        let mut out = HashMap::new();
        for pair in pairs {
            if let Some(plaintext) = results.get(&pair.handle) {
                out.insert(pair.handle.clone(), plaintext.clone());
            }
        }
        Ok(out)
    }

    fn create_encrypted_input(
        &self,
        contract_address: &str,
        user_address: &str,
    ) -> Box<dyn EncryptedInputBuilder> {
        Box::new(MockInputBuilder {
            contract: contract_address.to_string(),
            user: user_address.to_string(),
            values: Vec::new(),
            state: self.state.clone(),
        })
    }
}

#[derive(Default)]
pub struct MockSdk {
    pub init_calls: AtomicUsize,
    pub instances_created: AtomicUsize,
    fail_init: Mutex<Option<String>>,
    /// State handles of every instance created, in order
    pub instance_states: Mutex<Vec<Arc<MockInstanceState>>>,
    /// Configs passed to create_instance, as (relayer_url, gateway, preset)
    pub instance_configs: Mutex<Vec<(String, u64, String)>>,
}

impl MockSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_init_with(&self, message: &str) {
        *self.fail_init.lock().unwrap() = Some(message.to_string());
    }

    pub fn last_instance_state(&self) -> Option<Arc<MockInstanceState>> {
        self.instance_states.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl FhevmSdk for MockSdk {
    fn version(&self) -> Option<String> {
        Some("0.2.0-mock".to_string())
    }

    async fn init(&self) -> Result<(), SdkError> {
        if let Some(message) = self.fail_init.lock().unwrap().clone() {
            return Err(SdkError::new(message));
        }
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_instance(
        &self,
        config: InstanceConfig,
    ) -> Result<Arc<dyn FhevmInstance>, SdkError> {
        let id = self.instances_created.fetch_add(1, Ordering::SeqCst);
        self.instance_configs.lock().unwrap().push((
            config.relayer_url.clone(),
            config.gateway_chain_id,
            config.preset.clone(),
        ));
        let instance = MockInstance::new(id);
        self.instance_states
            .lock()
            .unwrap()
            .push(instance.state());
        Ok(Arc::new(instance))
    }
}
