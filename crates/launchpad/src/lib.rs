// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod chain;
mod error;
mod events;
mod flow;
mod orchestrator;

pub use chain::*;
pub use error::*;
pub use events::*;
pub use flow::*;
pub use orchestrator::*;
