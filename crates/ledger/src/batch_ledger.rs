// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LedgerError;
use alloy_primitives::Address;
use std::collections::{HashMap, HashSet};
use tally_events::{BatchClosed, BatchId, BatchOpened, Submission};
use tally_fhe::HomomorphicBackend;
use tally_utils::ArcBytes;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct Batch<C> {
    pub id: BatchId,
    pub open: bool,
    pub submissions: u64,
    pub accumulator: C,
}

/// Read-only view of a batch that can leave the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSnapshot {
    pub id: BatchId,
    pub open: bool,
    pub submissions: u64,
    pub accumulator_handle: ArcBytes,
}

/// Batch lifecycle (absent, open, closed) with one homomorphic accumulator per batch.
/// Batches are never removed.
pub struct BatchLedger<B: HomomorphicBackend> {
    backend: B,
    batches: HashMap<BatchId, Batch<B::Ciphertext>>,
    submitted: HashSet<(BatchId, Address)>,
}

impl<B: HomomorphicBackend> BatchLedger<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            batches: HashMap::new(),
            submitted: HashSet::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get(&self, batch_id: BatchId) -> Option<&Batch<B::Ciphertext>> {
        self.batches.get(&batch_id)
    }

    pub fn snapshot(&self, batch_id: BatchId) -> Option<BatchSnapshot> {
        self.get(batch_id).map(|batch| BatchSnapshot {
            id: batch.id,
            open: batch.open,
            submissions: batch.submissions,
            accumulator_handle: self.backend.to_handle(&batch.accumulator),
        })
    }

    pub fn has_submitted(&self, batch_id: BatchId, actor: &Address) -> bool {
        self.submitted.contains(&(batch_id, *actor))
    }

    /// Ordered ciphertext handles making up the batch's current state.
    pub fn handles(&self, batch_id: BatchId) -> Option<Vec<ArcBytes>> {
        self.get(batch_id)
            .map(|batch| vec![self.backend.to_handle(&batch.accumulator)])
    }

    pub fn open(&mut self, batch_id: BatchId) -> Result<BatchOpened, LedgerError> {
        if let Some(batch) = self.batches.get(&batch_id) {
            return Err(LedgerError::InvalidBatch {
                batch_id,
                reason: if batch.open {
                    "batch is already open"
                } else {
                    "batch was closed"
                },
            });
        }
        let accumulator = self.backend.encrypt_zero()?;
        self.batches.insert(
            batch_id,
            Batch {
                id: batch_id,
                open: true,
                submissions: 0,
                accumulator,
            },
        );
        info!(batch_id = %batch_id, "Batch opened");
        Ok(BatchOpened { batch_id })
    }

    pub fn close(&mut self, batch_id: BatchId) -> Result<BatchClosed, LedgerError> {
        let batch = self
            .batches
            .get_mut(&batch_id)
            .filter(|batch| batch.open)
            .ok_or(LedgerError::BatchClosed(batch_id))?;
        batch.open = false;
        info!(batch_id = %batch_id, submissions = batch.submissions, "Batch closed");
        Ok(BatchClosed {
            batch_id,
            submissions: batch.submissions,
        })
    }

    pub fn submit(
        &mut self,
        actor: Address,
        batch_id: BatchId,
        value: &B::Ciphertext,
        max_batch_size: u64,
    ) -> Result<Submission, LedgerError> {
        let batch = self
            .batches
            .get(&batch_id)
            .filter(|batch| batch.open)
            .ok_or(LedgerError::BatchClosed(batch_id))?;

        if batch.submissions >= max_batch_size {
            return Err(LedgerError::BatchFull {
                batch_id,
                max: max_batch_size,
            });
        }

        if self.has_submitted(batch_id, &actor) {
            return Err(LedgerError::InvalidBatch {
                batch_id,
                reason: "actor already submitted",
            });
        }

        if !self.backend.is_initialized(value) {
            return Err(LedgerError::InvalidCiphertext);
        }

        let accumulator = self.backend.add(&batch.accumulator, value)?;
        let ciphertext_handle = self.backend.to_handle(value);

        // All checks passed
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or(LedgerError::BatchClosed(batch_id))?;
        batch.accumulator = accumulator;
        batch.submissions += 1;
        self.submitted.insert((batch_id, actor));

        debug!(batch_id = %batch_id, actor = %actor, count = batch.submissions, "Submission accepted");
        Ok(Submission {
            actor,
            batch_id,
            ciphertext_handle,
        })
    }
}
