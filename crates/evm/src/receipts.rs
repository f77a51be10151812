// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Receipt waiting with an explicit deadline, and typed event extraction
//! from mined receipts.

use alloy::primitives::B256;
use alloy::providers::Provider;
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::SolEvent;
use alloy::transports::{RpcError, TransportErrorKind};
use thiserror::Error;
use tokio::time::{sleep, timeout, Duration};
use tracing::debug;

/// Default deadline for a wallet-submitted transaction to mine.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(180);

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum ReceiptError {
    #[error("transaction {0} not mined within {1:?}")]
    Timeout(B256, Duration),
    #[error("transaction {0} reverted")]
    TxFailed(B256),
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
}

/// Poll for the receipt of `tx_hash` until it mines or the deadline passes.
/// A mined-but-reverted transaction is an error, not a success with a flag.
pub async fn wait_for_receipt<P: Provider>(
    provider: &P,
    tx_hash: B256,
    deadline: Duration,
) -> Result<TransactionReceipt, ReceiptError> {
    let poll = async {
        loop {
            if let Some(receipt) = provider.get_transaction_receipt(tx_hash).await? {
                return Ok::<_, ReceiptError>(receipt);
            }
            debug!(%tx_hash, "receipt not available yet");
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    };

    let receipt = timeout(deadline, poll)
        .await
        .map_err(|_| ReceiptError::Timeout(tx_hash, deadline))??;

    if !receipt.status() {
        return Err(ReceiptError::TxFailed(tx_hash));
    }
    Ok(receipt)
}

/// All decodable occurrences of event `E` in a list of raw logs, in order.
pub fn decode_log_events<E: SolEvent>(logs: &[alloy::primitives::Log]) -> Vec<E> {
    logs.iter()
        .filter_map(|log| E::decode_log_data(&log.data).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::contracts::IDOPool;
    use alloy::primitives::{Address, U256};
    use alloy::sol_types::SolEvent;

    #[test]
    fn contributed_eth_event_round_trips_through_log_data() {
        let event = IDOPool::ContributedEth {
            user: Address::repeat_byte(0x33),
            amountWei: U256::from(1_000_000u64),
        };
        let data = event.encode_log_data();
        let decoded = IDOPool::ContributedEth::decode_log_data(&data).unwrap();
        assert_eq!(decoded.user, Address::repeat_byte(0x33));
        assert_eq!(decoded.amountWei, U256::from(1_000_000u64));
    }

    #[test]
    fn foreign_log_data_does_not_decode() {
        let event = IDOPool::ContributedZethc {
            user: Address::repeat_byte(0x33),
        };
        let data = event.encode_log_data();
        assert!(IDOPool::ContributedEth::decode_log_data(&data).is_err());
    }
}
