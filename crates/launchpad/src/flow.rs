// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use tokio::sync::watch;

/// Progress of one confidential operation. Terminal states are `Success`
/// and `Failed`; a new run resets to `Idle` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Approving,
    Submitting,
    AwaitingReceipt,
    Success,
    Failed(String),
}

/// Watchable progress handle for one flow. Orchestrators do not deduplicate
/// concurrent runs; callers gate on `is_busy` as the reference UI does.
pub struct FlowHandle {
    tx: watch::Sender<FlowState>,
}

impl Default for FlowHandle {
    fn default() -> Self {
        let (tx, _) = watch::channel(FlowState::Idle);
        Self { tx }
    }
}

impl FlowHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> FlowState {
        self.tx.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            *self.tx.borrow(),
            FlowState::Approving | FlowState::Submitting | FlowState::AwaitingReceipt
        )
    }

    pub(crate) fn set(&self, state: FlowState) {
        // No receivers is fine; the state is still readable via `current`.
        let _ = self.tx.send(state);
    }
}
