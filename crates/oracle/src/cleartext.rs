// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Cleartexts travel as ABI encoded `uint256` words, one per decrypted handle.

use alloy::primitives::U256;
use alloy::sol_types::SolValue;
use anyhow::{anyhow, bail, Result};
use tally_utils::ArcBytes;

pub const WORD_SIZE: usize = 32;

pub fn encode_cleartexts(values: &[u64]) -> ArcBytes {
    let mut out = Vec::with_capacity(values.len() * WORD_SIZE);
    for value in values {
        out.extend_from_slice(&U256::from(*value).abi_encode());
    }
    ArcBytes::from(out)
}

/// Decode a payload carrying exactly one aggregate.
pub fn decode_aggregate(data: &[u8]) -> Result<u64> {
    if data.len() != WORD_SIZE {
        bail!(
            "Expected a single {WORD_SIZE} byte word, got {} bytes",
            data.len()
        );
    }
    let value = <U256 as SolValue>::abi_decode(data)
        .map_err(|e| anyhow!("Error decoding cleartext word: {e}"))?;
    u64::try_from(value).map_err(|_| anyhow!("Aggregate {value} does not fit in 64 bits"))
}
