// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, B256, U256};
use tokio::sync::broadcast;

/// In-process notifications emitted when a flow reaches a terminal on-chain
/// outcome, so views can refresh without re-polling.
#[derive(Debug, Clone)]
pub enum LaunchpadEvent {
    NewContribution {
        pool: Address,
        user: Address,
        is_private: bool,
        amount_wei: Option<U256>,
        tx: B256,
    },
    SwapSettled {
        user: Address,
        ok: bool,
        reason: Option<String>,
    },
}

#[derive(Clone)]
pub struct LocalEventBus {
    tx: broadcast::Sender<LaunchpadEvent>,
}

impl Default for LocalEventBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(32);
        Self { tx }
    }
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LaunchpadEvent> {
        self.tx.subscribe()
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: LaunchpadEvent) {
        let _ = self.tx.send(event);
    }
}
