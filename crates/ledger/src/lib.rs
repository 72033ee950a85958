// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Confidential aggregation ledger.
//!
//! Participants submit encrypted values into batches. Each batch keeps a single homomorphic
//! accumulator, and once closed a provider can ask the decryption oracle to reveal the aggregate.
//! The oracle answers asynchronously and the answer is only accepted if it matches the ciphertext
//! state the request was bound to.
//!
//! [`Ledger`] is the synchronous core. [`LedgerActor`] wraps it in an actix actor so every
//! mutation of one ledger is handled to completion before the next, and publishes the resulting
//! events on the event bus.

mod access_control;
mod actor;
mod batch_ledger;
mod clock;
mod config_store;
mod decryption;
mod error;
mod ledger;

pub use access_control::*;
pub use actor::*;
pub use batch_ledger::*;
pub use clock::*;
pub use config_store::*;
pub use decryption::*;
pub use error::*;
pub use ledger::*;
