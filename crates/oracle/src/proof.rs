// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Decryption proofs.
//!
//! A proof is the oracle's `eth_sign` (EIP-191) signature over
//! `keccak256(abi.encodePacked(requestId, cleartexts))`. Binding the request id into the digest
//! stops a valid answer for one request being replayed against another.

use alloy::primitives::{keccak256, Address, Bytes, Signature, U256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy::sol_types::SolValue;
use anyhow::{anyhow, bail, Result};
use tally_events::RequestId;
use tally_utils::ArcBytes;

pub fn cleartext_digest(request_id: RequestId, cleartexts: &[u8]) -> [u8; 32] {
    let encoded = (
        U256::from(request_id.value()),
        Bytes::copy_from_slice(cleartexts),
    )
        .abi_encode_packed();
    keccak256(&encoded).into()
}

/// Sign the answer to `request_id`. Returns the 65 byte signature (r ‖ s ‖ v).
pub fn sign_cleartexts(
    signer: &PrivateKeySigner,
    request_id: RequestId,
    cleartexts: &[u8],
) -> Result<ArcBytes> {
    let digest = cleartext_digest(request_id, cleartexts);
    let sig = signer
        .sign_message_sync(&digest)
        .map_err(|e| anyhow!("Failed to sign cleartexts: {e}"))?;
    Ok(ArcBytes::from_bytes(&sig.as_bytes()))
}

pub fn recover_signer(request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> Result<Address> {
    let sig = Signature::try_from(proof).map_err(|e| anyhow!("Invalid signature: {e}"))?;
    let digest = cleartext_digest(request_id, cleartexts);
    sig.recover_address_from_msg(&digest)
        .map_err(|e| anyhow!("Failed to recover signer address: {e}"))
}

/// Accepts proofs signed by one known oracle address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofVerifier {
    oracle: Address,
}

impl ProofVerifier {
    pub fn new(oracle: Address) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> Address {
        self.oracle
    }

    pub fn verify(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> Result<()> {
        let recovered = recover_signer(request_id, cleartexts, proof)?;
        if recovered != self.oracle {
            bail!(
                "Proof signed by {recovered}, expected oracle {}",
                self.oracle
            );
        }
        Ok(())
    }
}
