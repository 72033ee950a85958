// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LedgerError;
use alloy_primitives::{Address, Keccak256};
use anyhow::anyhow;
use std::collections::{HashMap, VecDeque};
use tally_events::{
    BatchId, DecryptionComplete, DecryptionRequestEvicted, DecryptionRequested, Fingerprint,
    RequestId,
};
use tally_oracle::decode_aggregate;
use tally_utils::ArcBytes;
use tracing::{info, warn};

/// Digest binding a decryption request to one ledger and one exact ciphertext state.
///
/// Each handle is length prefixed so that no two distinct handle lists hash the same, and the
/// ledger identity is appended so a request cannot be replayed against another deployment.
pub fn fingerprint(identity: &Address, handles: &[ArcBytes]) -> Fingerprint {
    let mut hasher = Keccak256::new();
    for handle in handles {
        hasher.update((handle.len() as u64).to_be_bytes());
        hasher.update(handle.as_ref());
    }
    hasher.update(identity.as_slice());
    Fingerprint(hasher.finalize().0)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionRequest {
    pub request_id: RequestId,
    pub batch_id: BatchId,
    pub fingerprint: Fingerprint,
    pub processed: bool,
}

/// Outcome of issuing a request: the request itself plus anything evicted to make room for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionIssued {
    pub requested: DecryptionRequested,
    pub evicted: Vec<DecryptionRequestEvicted>,
}

pub struct DecryptionCoordinator {
    identity: Address,
    requests: HashMap<RequestId, DecryptionRequest>,
    /// Unprocessed requests, oldest first
    pending: VecDeque<RequestId>,
}

impl DecryptionCoordinator {
    pub fn new(identity: Address) -> Self {
        Self {
            identity,
            requests: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn get(&self, request_id: RequestId) -> Option<&DecryptionRequest> {
        self.requests.get(&request_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Record a request for `batch_id` whose current state is `handles`.
    ///
    /// `issue` hands the handles to the oracle and yields the id the oracle assigned. Nothing is
    /// recorded if issuing fails.
    pub fn request(
        &mut self,
        batch_id: BatchId,
        handles: Vec<ArcBytes>,
        max_pending: Option<usize>,
        issue: impl FnOnce(Vec<ArcBytes>) -> anyhow::Result<RequestId>,
    ) -> Result<DecryptionIssued, LedgerError> {
        let fingerprint = fingerprint(&self.identity, &handles);
        let request_id = issue(handles)?;
        if self.requests.contains_key(&request_id) {
            return Err(anyhow!("Oracle reused request id {request_id}").into());
        }

        self.requests.insert(
            request_id,
            DecryptionRequest {
                request_id,
                batch_id,
                fingerprint,
                processed: false,
            },
        );
        self.pending.push_back(request_id);
        info!(request_id = %request_id, batch_id = %batch_id, fingerprint = %fingerprint, "Decryption requested");

        let mut evicted = vec![];
        if let Some(limit) = max_pending {
            while self.pending.len() > limit {
                let Some(oldest) = self.pending.pop_front() else {
                    break;
                };
                if let Some(request) = self.requests.remove(&oldest) {
                    warn!(request_id = %oldest, batch_id = %request.batch_id, "Evicting pending decryption request");
                    evicted.push(DecryptionRequestEvicted {
                        request_id: oldest,
                        batch_id: request.batch_id,
                    });
                }
            }
        }

        Ok(DecryptionIssued {
            requested: DecryptionRequested {
                request_id,
                batch_id,
                fingerprint,
            },
            evicted,
        })
    }

    /// Accept the oracle's answer to `request_id`.
    ///
    /// `current_handles` yields the batch's ciphertext state now, `verify` checks the proof. The
    /// request is only marked processed once every check has passed.
    pub fn on_callback(
        &mut self,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &[u8],
        current_handles: impl FnOnce(BatchId) -> Option<Vec<ArcBytes>>,
        verify: impl FnOnce(RequestId, &[u8], &[u8]) -> anyhow::Result<()>,
    ) -> Result<DecryptionComplete, LedgerError> {
        let request = match self.requests.get(&request_id) {
            Some(request) if request.processed => {
                return Err(LedgerError::AlreadyProcessed(request_id))
            }
            Some(request) => request,
            None => return Err(LedgerError::UnknownRequest(request_id)),
        };
        let batch_id = request.batch_id;

        let current = current_handles(batch_id).map(|h| fingerprint(&self.identity, &h));
        if current != Some(request.fingerprint) {
            return Err(LedgerError::InvalidStateHash(request_id));
        }

        verify(request_id, cleartexts, proof).map_err(|e| LedgerError::InvalidProof {
            request_id,
            reason: e.to_string(),
        })?;

        let aggregate = decode_aggregate(cleartexts)
            .map_err(|e| LedgerError::InvalidCleartext(e.to_string()))?;

        if let Some(request) = self.requests.get_mut(&request_id) {
            request.processed = true;
        }
        self.pending.retain(|id| *id != request_id);

        info!(request_id = %request_id, batch_id = %batch_id, aggregate, "Decryption complete");
        Ok(DecryptionComplete {
            request_id,
            batch_id,
            aggregate,
        })
    }
}
