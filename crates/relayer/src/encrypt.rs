// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Encrypted input construction: one euint64 value bound to a
//! (contract, user) pair, normalized to a hex handle + proof ready to ride
//! in a transaction argument list.

use crate::error::{RelayerError, SdkError};
use crate::manager::RelayerManager;
use crate::sdk::{ExtraData, RawEncryptedPayload};
use alloy_primitives::Address;
use tracing::{debug, warn};

/// Ciphertext handle + input proof, both canonical `0x` hex. All-or-nothing:
/// either both fields are valid or the whole operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub data: String,
    pub proof: String,
}

/// The two relayer protocol generations, tried in this order. The 0.7
/// protocol wants the `extraData` audit envelope; older relayers reject
/// unknown fields, so the second attempt goes without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptStrategy {
    WithExtraData,
    Legacy,
}

impl EncryptStrategy {
    /// Fixed attempt order.
    pub const ORDER: [EncryptStrategy; 2] =
        [EncryptStrategy::WithExtraData, EncryptStrategy::Legacy];

    fn envelope(self, extra_data: &ExtraData) -> Option<ExtraData> {
        match self {
            EncryptStrategy::WithExtraData => Some(extra_data.clone()),
            EncryptStrategy::Legacy => None,
        }
    }
}

pub(crate) fn parse_checksummed(raw: &str) -> Result<(Address, String), RelayerError> {
    let address: Address = raw
        .parse()
        .map_err(|_| RelayerError::InvalidAddress(raw.to_string()))?;
    Ok((address, address.to_checksum(None)))
}

impl RelayerManager {
    /// Encrypt a 64-bit unsigned value for submission to `contract_address`
    /// by `user_address`. `function_name` only labels the audit envelope.
    pub async fn encrypt_uint64(
        &self,
        contract_address: &str,
        user_address: &str,
        value: u128,
        function_name: &str,
    ) -> Result<EncryptedPayload, RelayerError> {
        // Validate everything local before touching the SDK or the network.
        let (_, contract) = parse_checksummed(contract_address)?;
        let (_, user) = parse_checksummed(user_address)?;
        let value: u64 = value
            .try_into()
            .map_err(|_| RelayerError::ValueOutOfRange(value))?;

        let session = self.ensure_instance(true).await?;
        let instance = session.instance.ok_or(RelayerError::MissingConfig)?;
        let settings = self.settings().await;

        debug!(%contract, %user, value, function_name, "building encrypted input");

        let extra_data = ExtraData {
            chain_id: settings.chain_id,
            gateway_chain_id: settings.gateway_chain_id.unwrap_or_default(),
            contract_address: contract.clone(),
            user_address: user.clone(),
            function: function_name.to_string(),
            arg_types: vec!["euint64".to_string()],
        };

        let raw = self
            .run_encrypt_strategies(&instance, &contract, &user, value, extra_data)
            .await?;

        let handle = raw.handles.first().ok_or_else(|| {
            RelayerError::EncryptionFailed {
                source: SdkError::new("invalid encryption result: missing handles"),
            }
        })?;
        let data = handle
            .to_canonical_hex()
            .map_err(RelayerError::UnsupportedHandle)?;
        let proof = raw
            .input_proof
            .to_canonical_hex()
            .map_err(RelayerError::UnsupportedProof)?;

        Ok(EncryptedPayload { data, proof })
    }

    async fn run_encrypt_strategies(
        &self,
        instance: &std::sync::Arc<dyn crate::sdk::FhevmInstance>,
        contract: &str,
        user: &str,
        value: u64,
        extra_data: ExtraData,
    ) -> Result<RawEncryptedPayload, RelayerError> {
        let mut last_err: Option<SdkError> = None;
        for strategy in EncryptStrategy::ORDER {
            // The input builder is single-use, so each strategy opens its own.
            let mut input = instance.create_encrypted_input(contract, user);
            input.add64(value);
            let err = match input.encrypt(strategy.envelope(&extra_data)).await {
                Ok(raw) => return Ok(raw),
                Err(err) => err,
            };

            // An explicit missing-extraData complaint means the SDK/relayer
            // pair cannot interoperate; falling back would mask the version
            // skew.
            if strategy == EncryptStrategy::WithExtraData && err.is_missing_extra_data() {
                return Err(RelayerError::ExtraDataRequired);
            }
            if strategy == EncryptStrategy::WithExtraData {
                warn!(error = %err, "encrypt with extraData failed, retrying in legacy format");
            }
            last_err = Some(err);
        }
        let source = last_err
            .unwrap_or_else(|| SdkError::new("no encryption strategy produced a result"));
        Err(RelayerError::EncryptionFailed { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_order_tries_the_audit_envelope_first() {
        assert_eq!(
            EncryptStrategy::ORDER,
            [EncryptStrategy::WithExtraData, EncryptStrategy::Legacy]
        );
        let extra = ExtraData {
            chain_id: 1,
            gateway_chain_id: 2,
            contract_address: "0x0000000000000000000000000000000000000001".to_string(),
            user_address: "0x0000000000000000000000000000000000000002".to_string(),
            function: "contribute".to_string(),
            arg_types: vec!["euint64".to_string()],
        };
        assert!(EncryptStrategy::WithExtraData.envelope(&extra).is_some());
        assert!(EncryptStrategy::Legacy.envelope(&extra).is_none());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(parse_checksummed("0x1234").is_err());
        assert!(parse_checksummed("not-an-address").is_err());
        let (_, checksummed) =
            parse_checksummed("0x95e8250c6cc42148d8d067c1aaf6b6d961be338f").unwrap();
        assert_eq!(checksummed, "0x95E8250c6cc42148d8D067C1AAF6b6d961be338f");
    }
}
