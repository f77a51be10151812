// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{utils, U256};
use anyhow::{Context, Result};

/// Parse a decimal ETH amount ("1.5") into wei.
pub fn parse_ether(amount: &str) -> Result<U256> {
    utils::parse_ether(amount).with_context(|| format!("invalid ETH amount {amount:?}"))
}

/// Render a wei amount as a decimal ETH string.
pub fn format_ether(wei: U256) -> String {
    utils::format_ether(wei)
}
