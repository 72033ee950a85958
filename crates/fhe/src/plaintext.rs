// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextDecryptor, HomomorphicBackend};
use anyhow::{anyhow, bail, Result};
use tally_utils::ArcBytes;

/// Passthrough "ciphertext" that simply carries its value. `Default` is the uninitialized
/// placeholder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlainCiphertext(Option<u64>);

impl PlainCiphertext {
    pub fn uninitialized() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<u64> {
        self.0
    }
}

/// Backend with no cryptography at all. Lets coordinator logic be exercised without paying for
/// real homomorphic operations.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaintextBackend;

impl PlaintextBackend {
    pub fn encrypt(&self, value: u64) -> PlainCiphertext {
        PlainCiphertext(Some(value))
    }
}

impl HomomorphicBackend for PlaintextBackend {
    type Ciphertext = PlainCiphertext;

    fn encrypt_zero(&self) -> Result<PlainCiphertext> {
        Ok(PlainCiphertext(Some(0)))
    }

    fn add(&self, lhs: &PlainCiphertext, rhs: &PlainCiphertext) -> Result<PlainCiphertext> {
        let (Some(a), Some(b)) = (lhs.0, rhs.0) else {
            bail!("Cannot add an uninitialized ciphertext");
        };
        let sum = a
            .checked_add(b)
            .ok_or_else(|| anyhow!("Plaintext accumulator overflowed"))?;
        Ok(PlainCiphertext(Some(sum)))
    }

    fn is_initialized(&self, ciphertext: &PlainCiphertext) -> bool {
        ciphertext.0.is_some()
    }

    fn to_handle(&self, ciphertext: &PlainCiphertext) -> ArcBytes {
        match ciphertext.0 {
            Some(value) => ArcBytes::from_bytes(&value.to_le_bytes()),
            None => ArcBytes::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PlaintextDecryptor;

impl CiphertextDecryptor for PlaintextDecryptor {
    fn decrypt_handle(&self, handle: &[u8]) -> Result<u64> {
        let bytes: [u8; 8] = handle
            .try_into()
            .map_err(|_| anyhow!("Plaintext handle must be 8 bytes, got {}", handle.len()))?;
        Ok(u64::from_le_bytes(bytes))
    }
}
