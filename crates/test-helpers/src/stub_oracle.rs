// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Recipient;
use anyhow::{anyhow, bail, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tally_events::RequestId;
use tally_oracle::{encode_cleartexts, DecryptionCallback, DecryptionOracle};
use tally_utils::ArcBytes;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedRequest {
    pub request_id: RequestId,
    pub handles: Vec<ArcBytes>,
}

#[derive(Default)]
struct StubState {
    next_id: u64,
    issued: Vec<IssuedRequest>,
    callbacks: Vec<(RequestId, Recipient<DecryptionCallback>)>,
    reject_proofs: bool,
    fail_issuance: bool,
}

/// Oracle double. Records what it was asked, never answers on its own, and accepts every proof
/// unless told otherwise.
#[derive(Clone, Default)]
pub struct StubOracle {
    state: Arc<Mutex<StubState>>,
}

impl StubOracle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StubState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("StubOracle mutex poisoned"))
    }

    pub fn issued(&self) -> Result<Vec<IssuedRequest>> {
        Ok(self.lock()?.issued.clone())
    }

    pub fn last_issued(&self) -> Result<IssuedRequest> {
        self.lock()?
            .issued
            .last()
            .cloned()
            .ok_or_else(|| anyhow!("No decryption was requested"))
    }

    pub fn reject_proofs(&self, reject: bool) -> Result<()> {
        self.lock()?.reject_proofs = reject;
        Ok(())
    }

    pub fn fail_issuance(&self, fail: bool) -> Result<()> {
        self.lock()?.fail_issuance = fail;
        Ok(())
    }

    /// Deliver `value` as the answer to `request_id` through the recipient given at issuance.
    pub fn answer(&self, request_id: RequestId, value: u64) -> Result<()> {
        let recipient = self
            .lock()?
            .callbacks
            .iter()
            .find(|(id, _)| *id == request_id)
            .map(|(_, recipient)| recipient.clone())
            .ok_or_else(|| anyhow!("{request_id} was never issued"))?;
        recipient.do_send(DecryptionCallback {
            request_id,
            cleartexts: encode_cleartexts(&[value]),
            proof: ArcBytes::from_bytes(b"stub-proof"),
        });
        Ok(())
    }
}

impl DecryptionOracle for StubOracle {
    fn request_decryption(
        &self,
        handles: Vec<ArcBytes>,
        callback: Recipient<DecryptionCallback>,
    ) -> Result<RequestId> {
        let mut state = self.lock()?;
        if state.fail_issuance {
            bail!("Oracle unavailable");
        }
        state.next_id += 1;
        let request_id = RequestId::new(state.next_id);
        state.issued.push(IssuedRequest {
            request_id,
            handles,
        });
        state.callbacks.push((request_id, callback));
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: RequestId, _: &[u8], _: &[u8]) -> Result<()> {
        if self.lock()?.reject_proofs {
            bail!("Proof for {request_id} rejected");
        }
        Ok(())
    }
}
