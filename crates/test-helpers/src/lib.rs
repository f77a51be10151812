// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod mock_sdk;
mod mock_wallet;

pub use mock_sdk::*;
pub use mock_wallet::*;
