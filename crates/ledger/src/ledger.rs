// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    AccessControl, BatchLedger, BatchSnapshot, Clock, ConfigStore, DecryptionCoordinator,
    DecryptionIssued, DecryptionRequest, LedgerError,
};
use actix::Recipient;
use alloy_primitives::Address;
use std::sync::Arc;
use tally_config::LedgerConfig;
use tally_events::{
    BatchClosed, BatchId, BatchOpened, CooldownUpdated, DecryptionComplete, MaxBatchSizeUpdated,
    ModelVersionUpdated, Paused, ProviderAdded, ProviderRemoved, RequestId, Submission, Unpaused,
};
use tally_fhe::HomomorphicBackend;
use tally_oracle::{DecryptionCallback, DecryptionOracle};

/// Synchronous ledger core.
///
/// Every mutating operation checks all of its preconditions before writing anything, so a
/// rejected call leaves the ledger untouched. Gating order is role, pause, cooldown and then the
/// operation's own state checks. Owner administration is exempt from the cooldown, and the
/// decryption callback is exempt from both pause and cooldown.
pub struct Ledger<B: HomomorphicBackend> {
    access: AccessControl,
    config: ConfigStore,
    batches: BatchLedger<B>,
    decryption: DecryptionCoordinator,
    oracle: Arc<dyn DecryptionOracle>,
    clock: Arc<dyn Clock>,
}

impl<B: HomomorphicBackend> Ledger<B> {
    pub fn from_config(
        config: &LedgerConfig,
        backend: B,
        oracle: Arc<dyn DecryptionOracle>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        let mut access = AccessControl::new(config.owner);
        for provider in &config.providers {
            if !access.is_provider(provider) {
                access.add_provider(&config.owner, *provider)?;
            }
        }
        Ok(Self {
            access,
            config: ConfigStore::from_config(config)?,
            batches: BatchLedger::new(backend),
            decryption: DecryptionCoordinator::new(config.identity),
            oracle,
            clock,
        })
    }

    pub fn backend(&self) -> &B {
        self.batches.backend()
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn identity(&self) -> Address {
        self.decryption.identity()
    }

    pub fn is_owner(&self, actor: &Address) -> bool {
        self.access.is_owner(actor)
    }

    pub fn is_provider(&self, actor: &Address) -> bool {
        self.access.is_provider(actor)
    }

    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    pub fn settings(&self) -> ConfigStore {
        self.config
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<BatchSnapshot> {
        self.batches.snapshot(batch_id)
    }

    pub fn decryption_request(&self, request_id: RequestId) -> Option<DecryptionRequest> {
        self.decryption.get(request_id).cloned()
    }

    pub fn pending_requests(&self) -> usize {
        self.decryption.pending_count()
    }

    pub fn pause(&mut self, caller: Address) -> Result<Paused, LedgerError> {
        self.access.pause(&caller)
    }

    pub fn unpause(&mut self, caller: Address) -> Result<Unpaused, LedgerError> {
        self.access.unpause(&caller)
    }

    pub fn add_provider(
        &mut self,
        caller: Address,
        provider: Address,
    ) -> Result<ProviderAdded, LedgerError> {
        self.access.add_provider(&caller, provider)
    }

    pub fn remove_provider(
        &mut self,
        caller: Address,
        provider: Address,
    ) -> Result<ProviderRemoved, LedgerError> {
        self.access.remove_provider(&caller, provider)
    }

    pub fn set_cooldown_interval(
        &mut self,
        caller: Address,
        value: u64,
    ) -> Result<CooldownUpdated, LedgerError> {
        self.access.ensure_owner(&caller)?;
        self.config.set_cooldown_interval(value)
    }

    pub fn set_max_batch_size(
        &mut self,
        caller: Address,
        value: u64,
    ) -> Result<MaxBatchSizeUpdated, LedgerError> {
        self.access.ensure_owner(&caller)?;
        self.config.set_max_batch_size(value)
    }

    pub fn set_model_version(
        &mut self,
        caller: Address,
        value: u64,
    ) -> Result<ModelVersionUpdated, LedgerError> {
        self.access.ensure_owner(&caller)?;
        self.config.set_model_version(value)
    }

    /// Open the batch for the current model version.
    pub fn open_batch(&mut self, caller: Address) -> Result<BatchOpened, LedgerError> {
        let now = self.gate(&caller, true)?;
        let opened = self.batches.open(self.config.current_batch_id())?;
        self.access.record_action(caller, now);
        Ok(opened)
    }

    pub fn close_batch(
        &mut self,
        caller: Address,
        batch_id: BatchId,
    ) -> Result<BatchClosed, LedgerError> {
        let now = self.gate(&caller, true)?;
        let closed = self.batches.close(batch_id)?;
        self.access.record_action(caller, now);
        Ok(closed)
    }

    pub fn submit(
        &mut self,
        caller: Address,
        batch_id: BatchId,
        value: &B::Ciphertext,
    ) -> Result<Submission, LedgerError> {
        let now = self.gate(&caller, false)?;
        let submission =
            self.batches
                .submit(caller, batch_id, value, self.config.max_batch_size())?;
        self.access.record_action(caller, now);
        Ok(submission)
    }

    /// Ask the oracle to decrypt a closed, non-empty batch. The answer is delivered to `callback`.
    pub fn request_decryption(
        &mut self,
        caller: Address,
        batch_id: BatchId,
        callback: Recipient<DecryptionCallback>,
    ) -> Result<DecryptionIssued, LedgerError> {
        let now = self.gate(&caller, true)?;

        let batch = self.batches.get(batch_id).ok_or(LedgerError::InvalidBatch {
            batch_id,
            reason: "batch does not exist",
        })?;
        if batch.open {
            return Err(LedgerError::InvalidBatch {
                batch_id,
                reason: "batch is still open",
            });
        }
        if batch.submissions == 0 {
            return Err(LedgerError::InvalidBatch {
                batch_id,
                reason: "batch has no submissions",
            });
        }
        let handles = self.batches.handles(batch_id).ok_or(LedgerError::InvalidBatch {
            batch_id,
            reason: "batch does not exist",
        })?;

        let oracle = self.oracle.clone();
        let issued = self.decryption.request(
            batch_id,
            handles,
            self.config.max_pending_requests(),
            |handles| oracle.request_decryption(handles, callback),
        )?;
        self.access.record_action(caller, now);
        Ok(issued)
    }

    /// Entry point for the oracle's answer.
    pub fn on_decryption_callback(
        &mut self,
        request_id: RequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<DecryptionComplete, LedgerError> {
        let batches = &self.batches;
        let oracle = &self.oracle;
        self.decryption.on_callback(
            request_id,
            cleartexts,
            proof,
            |batch_id| batches.handles(batch_id),
            |request_id, cleartexts, proof| oracle.verify_proof(request_id, cleartexts, proof),
        )
    }

    /// Role, pause and cooldown checks shared by batch operations. Returns the current time.
    fn gate(&self, caller: &Address, provider_only: bool) -> Result<u64, LedgerError> {
        if provider_only {
            self.access.ensure_provider(caller)?;
        }
        self.access.ensure_not_paused()?;
        let now = self.clock.now();
        self.access
            .check_cooldown(caller, now, self.config.cooldown_interval())?;
        Ok(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use anyhow::Result;
    use tally_events::Fingerprint;
    use tally_fhe::{PlainCiphertext, PlaintextBackend};
    use tally_oracle::encode_cleartexts;
    use tally_test_helpers::{actor, config_with_providers, owner, CallbackSink, StubOracle};

    struct Fixture {
        ledger: Ledger<PlaintextBackend>,
        oracle: StubOracle,
        clock: ManualClock,
    }

    impl Fixture {
        fn new(config: LedgerConfig) -> Result<Self> {
            let oracle = StubOracle::new();
            let clock = ManualClock::new(1_000);
            let ledger = Ledger::from_config(
                &config,
                PlaintextBackend,
                Arc::new(oracle.clone()),
                Arc::new(clock.clone()),
            )?;
            Ok(Self {
                ledger,
                oracle,
                clock,
            })
        }

        fn tick(&self) {
            self.clock.advance(5);
        }

        fn value(&self, v: u64) -> PlainCiphertext {
            PlaintextBackend.encrypt(v)
        }

        /// open, submit `values` from distinct actors, close
        fn closed_batch(&mut self, values: &[u64]) -> Result<BatchId> {
            let batch_id = self.ledger.open_batch(owner())?.batch_id;
            for (i, v) in values.iter().enumerate() {
                let value = self.value(*v);
                self.ledger.submit(actor(i as u8 + 1), batch_id, &value)?;
            }
            self.tick();
            self.ledger.close_batch(owner(), batch_id)?;
            self.tick();
            Ok(batch_id)
        }
    }

    #[test]
    fn initial_providers_come_from_config() -> Result<()> {
        let fixture = Fixture::new(config_with_providers(&[actor(7), owner()]))?;
        assert!(fixture.ledger.is_provider(&actor(7)));
        assert!(fixture.ledger.is_provider(&owner()));
        assert!(!fixture.ledger.is_provider(&actor(8)));
        Ok(())
    }

    #[test]
    fn batch_operations_are_provider_gated() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig::default())?;
        assert!(matches!(
            f.ledger.open_batch(actor(1)),
            Err(LedgerError::NotProvider { .. })
        ));
        let batch_id = f.ledger.open_batch(owner())?.batch_id;
        assert_eq!(batch_id, BatchId::new(1));
        f.tick();
        assert!(matches!(
            f.ledger.close_batch(actor(1), batch_id),
            Err(LedgerError::NotProvider { .. })
        ));

        f.ledger.add_provider(owner(), actor(1))?;
        f.ledger.close_batch(actor(1), batch_id)?;
        Ok(())
    }

    #[test]
    fn pause_blocks_new_work() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig::default())?;
        let batch_id = f.ledger.open_batch(owner())?.batch_id;
        f.ledger.pause(owner())?;
        f.tick();

        let value = f.value(1);
        assert!(matches!(
            f.ledger.submit(actor(1), batch_id, &value),
            Err(LedgerError::Paused)
        ));
        assert!(matches!(
            f.ledger.close_batch(owner(), batch_id),
            Err(LedgerError::Paused)
        ));

        f.ledger.unpause(owner())?;
        f.ledger.submit(actor(1), batch_id, &value)?;
        Ok(())
    }

    #[test]
    fn cooldown_applies_across_operations() -> Result<()> {
        let mut f = Fixture::new(config_with_providers(&[actor(1)]))?;
        let batch_id = f.ledger.open_batch(owner())?.batch_id;
        f.tick();

        let value = f.value(4);
        f.ledger.submit(actor(1), batch_id, &value)?;
        f.clock.advance(2);
        assert!(matches!(
            f.ledger.close_batch(actor(1), batch_id),
            Err(LedgerError::CooldownActive { remaining: 3 })
        ));

        // a rejected call does not restart the window
        f.clock.advance(3);
        f.ledger.close_batch(actor(1), batch_id)?;
        Ok(())
    }

    #[test]
    fn config_changes_are_owner_only() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig::default())?;
        assert!(matches!(
            f.ledger.set_max_batch_size(actor(1), 3),
            Err(LedgerError::NotOwner { .. })
        ));
        f.ledger.set_max_batch_size(owner(), 2)?;
        f.ledger.set_cooldown_interval(owner(), 0)?;
        f.ledger.set_model_version(owner(), 4)?;

        let batch_id = f.ledger.open_batch(owner())?.batch_id;
        assert_eq!(batch_id, BatchId::new(4));
        for i in 1..=2 {
            let value = f.value(1);
            f.ledger.submit(actor(i), batch_id, &value)?;
        }
        let value = f.value(1);
        assert!(matches!(
            f.ledger.submit(actor(3), batch_id, &value),
            Err(LedgerError::BatchFull { .. })
        ));
        assert_eq!(f.ledger.settings().max_batch_size(), 2);
        Ok(())
    }

    #[actix::test]
    async fn request_decryption_requires_a_closed_non_empty_batch() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig::default())?;

        assert!(matches!(
            f.ledger.request_decryption(owner(), BatchId::new(1), CallbackSink::recipient()),
            Err(LedgerError::InvalidBatch { .. })
        ));

        let batch_id = f.ledger.open_batch(owner())?.batch_id;
        f.tick();
        assert!(matches!(
            f.ledger.request_decryption(owner(), batch_id, CallbackSink::recipient()),
            Err(LedgerError::InvalidBatch { .. })
        ));

        f.ledger.close_batch(owner(), batch_id)?;
        f.tick();
        assert!(matches!(
            f.ledger.request_decryption(owner(), batch_id, CallbackSink::recipient()),
            Err(LedgerError::InvalidBatch { .. })
        ));
        assert!(f.oracle.issued()?.is_empty());
        Ok(())
    }

    #[actix::test]
    async fn decrypts_and_completes_exactly_once() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig::default())?;
        let batch_id = f.closed_batch(&[2, 3, 5])?;

        let issued = f
            .ledger
            .request_decryption(owner(), batch_id, CallbackSink::recipient())?;
        let request_id = issued.requested.request_id;
        let sent = f.oracle.last_issued()?;
        assert_eq!(sent.request_id, request_id);

        let snapshot = f.ledger.batch(batch_id).expect("batch exists");
        assert_eq!(sent.handles, vec![snapshot.accumulator_handle.clone()]);
        assert_eq!(
            issued.requested.fingerprint,
            crate::fingerprint(&f.ledger.identity(), &[snapshot.accumulator_handle])
        );

        let cleartexts = encode_cleartexts(&[10]);
        let complete = f
            .ledger
            .on_decryption_callback(request_id, &cleartexts, b"proof")?;
        assert_eq!(complete.aggregate, 10);
        assert_eq!(complete.batch_id, batch_id);

        assert!(matches!(
            f.ledger
                .on_decryption_callback(request_id, &cleartexts, b"proof"),
            Err(LedgerError::AlreadyProcessed(_))
        ));
        assert!(f
            .ledger
            .decryption_request(request_id)
            .is_some_and(|r| r.processed));
        Ok(())
    }

    #[actix::test]
    async fn rejected_proofs_do_not_consume_the_request() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig::default())?;
        let batch_id = f.closed_batch(&[1])?;
        let request_id = f
            .ledger
            .request_decryption(owner(), batch_id, CallbackSink::recipient())?
            .requested
            .request_id;

        f.oracle.reject_proofs(true)?;
        let cleartexts = encode_cleartexts(&[1]);
        assert!(matches!(
            f.ledger.on_decryption_callback(request_id, &cleartexts, &[]),
            Err(LedgerError::InvalidProof { .. })
        ));
        assert!(matches!(
            f.ledger
                .on_decryption_callback(RequestId::new(42), &cleartexts, &[]),
            Err(LedgerError::UnknownRequest(_))
        ));

        f.oracle.reject_proofs(false)?;
        f.ledger.on_decryption_callback(request_id, &cleartexts, &[])?;
        Ok(())
    }

    #[actix::test]
    async fn callbacks_are_not_pause_gated() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig::default())?;
        let batch_id = f.closed_batch(&[6])?;
        let request_id = f
            .ledger
            .request_decryption(owner(), batch_id, CallbackSink::recipient())?
            .requested
            .request_id;

        f.ledger.pause(owner())?;
        let complete =
            f.ledger
                .on_decryption_callback(request_id, &encode_cleartexts(&[6]), &[])?;
        assert_eq!(complete.aggregate, 6);
        Ok(())
    }

    #[actix::test]
    async fn oracle_failure_leaves_no_trace() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig::default())?;
        let batch_id = f.closed_batch(&[6])?;
        f.oracle.fail_issuance(true)?;

        assert!(matches!(
            f.ledger
                .request_decryption(owner(), batch_id, CallbackSink::recipient()),
            Err(LedgerError::Backend(_))
        ));
        assert_eq!(f.ledger.pending_requests(), 0);

        // no cooldown was recorded for the failed attempt
        f.oracle.fail_issuance(false)?;
        f.ledger
            .request_decryption(owner(), batch_id, CallbackSink::recipient())?;
        Ok(())
    }

    #[actix::test]
    async fn bounded_pending_requests_evict_the_oldest() -> Result<()> {
        let mut f = Fixture::new(LedgerConfig {
            max_pending_requests: Some(1),
            ..LedgerConfig::default()
        })?;
        let batch_id = f.closed_batch(&[3])?;

        let first = f
            .ledger
            .request_decryption(owner(), batch_id, CallbackSink::recipient())?;
        f.tick();
        let second = f
            .ledger
            .request_decryption(owner(), batch_id, CallbackSink::recipient())?;
        assert_eq!(second.evicted.len(), 1);
        assert_eq!(
            second.evicted[0].request_id,
            first.requested.request_id
        );
        assert_eq!(f.ledger.pending_requests(), 1);
        assert_ne!(
            first.requested.request_id,
            second.requested.request_id
        );
        // same state, same fingerprint
        assert_eq!(first.requested.fingerprint, second.requested.fingerprint);
        assert_ne!(second.requested.fingerprint, Fingerprint([0; 32]));
        Ok(())
    }
}
