// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod callback_sink;
mod fixtures;
mod stub_oracle;

pub use callback_sink::*;
pub use fixtures::*;
pub use stub_oracle::*;
