// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Ciphertext capabilities consumed by the ledger.
//!
//! The ledger never looks inside a ciphertext. It only needs to create an encrypted zero, add two
//! ciphertexts, check that a submitted value is a real ciphertext and obtain an opaque handle for
//! events and fingerprints. [`HomomorphicBackend`] captures exactly that surface, and
//! [`CiphertextDecryptor`] is the matching capability held by the decryption oracle.

mod backend;
mod bfv;
mod plaintext;

pub use backend::*;
pub use bfv::*;
pub use plaintext::*;
