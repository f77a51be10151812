// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! User-scoped decryption of an on-chain ciphertext handle: fresh ephemeral
//! keypair, EIP-712 authorization signed by the wallet, one relayer round
//! trip.

use crate::encrypt::parse_checksummed;
use crate::error::RelayerError;
use crate::manager::RelayerManager;
use crate::sdk::{HandleContractPair, UserDecryptRequest};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Validity window of a decryption authorization, in days. Kept short: the
/// authorization is single-purpose and a fresh one is built per request.
const DECRYPT_VALIDITY_DAYS: u64 = 1;

pub(crate) const USER_DECRYPT_PRIMARY_TYPE: &str = "UserDecryptRequestVerification";

fn unix_now_secs() -> Result<u64, RelayerError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| RelayerError::DecryptionFailed("system clock before unix epoch".into()))
}

fn parse_plaintext_u64(raw: &str) -> Result<u64, RelayerError> {
    let parsed = if let Some(hex_digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))
    {
        u64::from_str_radix(hex_digits, 16)
    } else {
        raw.parse::<u64>()
    };
    parsed.map_err(|_| RelayerError::DecryptionFailed(format!("unparseable plaintext {raw:?}")))
}

impl RelayerManager {
    /// Decrypt one euint64 ciphertext handle owned by `contract_address` for
    /// the active wallet account. Exactly one signature prompt and one
    /// relayer round trip; values are never cached here.
    pub async fn user_decrypt_uint64(
        &self,
        contract_address: &str,
        ciphertext_handle: &str,
    ) -> Result<u64, RelayerError> {
        let session = self.ensure_instance(true).await?;
        let instance = session.instance.ok_or(RelayerError::MissingConfig)?;

        let wallet = self.wallets().resolve().await?;
        let accounts = wallet.request_accounts().await?;
        let signer = accounts
            .first()
            .copied()
            .ok_or(RelayerError::NoWalletAccount)?;
        let signer_address = signer.to_checksum(None);
        let (_, contract) = parse_checksummed(contract_address)?;

        // Never reuse a keypair across requests: reuse would widen the
        // exposure window of the signed authorization.
        let keypair = instance.generate_keypair();
        let contract_addresses = vec![contract.clone()];
        let start_timestamp_sec = unix_now_secs()?;

        let mut document = instance.create_eip712(
            &keypair.public_key,
            &contract_addresses,
            start_timestamp_sec,
            DECRYPT_VALIDITY_DAYS,
        );
        document.primary_type = USER_DECRYPT_PRIMARY_TYPE.to_string();

        let signature = wallet
            .sign_typed_data_v4(signer, &document.to_sign_payload())
            .await?;
        // The relayer wants the raw hex signature without the 0x prefix.
        let signature_no_0x = signature
            .strip_prefix("0x")
            .or_else(|| signature.strip_prefix("0X"))
            .unwrap_or(&signature)
            .to_string();

        debug!(%contract, handle = %ciphertext_handle, signer = %signer_address,
               "requesting user decryption");

        let results = instance
            .user_decrypt(UserDecryptRequest {
                pairs: vec![HandleContractPair {
                    handle: ciphertext_handle.to_string(),
                    contract_address: contract.clone(),
                }],
                private_key: keypair.private_key,
                public_key: keypair.public_key,
                signature_no_0x,
                contract_addresses,
                signer_address,
                start_timestamp_sec,
                duration_days: DECRYPT_VALIDITY_DAYS,
            })
            .await?;

        let plaintext = results
            .get(ciphertext_handle)
            .ok_or_else(|| RelayerError::DecryptionResultMissing(ciphertext_handle.to_string()))?;

        parse_plaintext_u64(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex_plaintexts() {
        assert_eq!(parse_plaintext_u64("1500000000000000000").unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(parse_plaintext_u64("0x2a").unwrap(), 42);
        assert!(parse_plaintext_u64("not-a-number").is_err());
        assert!(parse_plaintext_u64("-1").is_err());
    }
}
