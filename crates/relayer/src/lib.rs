// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Client-side protocol for confidential values: discovers the externally
//! supplied FHE SDK, manages a configured relayer instance, builds encrypted
//! inputs bound to a contract+user pair, requests user-scoped decryptions
//! under an EIP-712 authorization, and fetches oracle decryption results.

mod decrypt;
mod encrypt;
mod error;
mod manager;
mod oracle;
mod sdk;
mod wallet;

pub use encrypt::*;
pub use error::*;
pub use manager::*;
pub use oracle::*;
pub use sdk::*;
pub use wallet::*;
