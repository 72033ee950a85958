// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use std::fmt::Debug;
use tally_utils::ArcBytes;

/// Additively homomorphic ciphertext operations.
pub trait HomomorphicBackend: Send + Sync + Unpin + 'static {
    type Ciphertext: Clone + Debug + Send + Sync + Unpin + 'static;

    /// Encrypted representation of zero, used to seed a batch accumulator.
    fn encrypt_zero(&self) -> Result<Self::Ciphertext>;

    /// Homomorphic sum of two ciphertexts.
    fn add(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<Self::Ciphertext>;

    /// False for placeholder values that were never produced by an encryption.
    fn is_initialized(&self, ciphertext: &Self::Ciphertext) -> bool;

    /// Opaque handle identifying the ciphertext. Handles are what events carry, what
    /// fingerprints are computed over and what the oracle is asked to decrypt.
    fn to_handle(&self, ciphertext: &Self::Ciphertext) -> ArcBytes;
}

/// Turns a handle produced by a [`HomomorphicBackend`] back into its plaintext value. Only the
/// decryption oracle holds one of these.
pub trait CiphertextDecryptor: Send + Sync + 'static {
    fn decrypt_handle(&self, handle: &[u8]) -> Result<u64>;
}
