// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod in_mem;
mod json_file;
mod models;
mod traits;

pub use error::*;
pub use in_mem::*;
pub use json_file::*;
pub use models::*;
pub use traits::*;
