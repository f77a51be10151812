// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod calldata;
mod contracts;
mod receipts;
mod units;

pub use calldata::*;
pub use contracts::*;
pub use receipts::*;
pub use units::*;
