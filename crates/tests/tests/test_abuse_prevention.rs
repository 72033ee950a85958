// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::prelude::*;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context as _, Result};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tally_config::LedgerConfig;
use tally_events::{
    new_event_bus_with_history, BatchId, ErrorEvent, HistoryCollector, LedgerEvent, RequestId,
    TakeEvents, TallyErrorType,
};
use tally_fhe::{PlainCiphertext, PlaintextBackend};
use tally_ledger::{
    fingerprint, AddProvider, CloseBatch, Ledger, LedgerActor, LedgerError, ManualClock,
    OpenBatch, RequestDecryption, Submit,
};
use tally_oracle::{
    encode_cleartexts, sign_cleartexts, DecryptionCallback, DecryptionOracle, ProofVerifier,
};
use tally_test_helpers::{actor, config_with_providers, identity, owner, StubOracle};
use tally_utils::ArcBytes;
use tokio::time::timeout;

type PlainLedger = Addr<LedgerActor<PlaintextBackend>>;

fn start_with(
    config: LedgerConfig,
    oracle: Arc<dyn DecryptionOracle>,
) -> Result<(PlainLedger, Addr<HistoryCollector<LedgerEvent>>, ManualClock)> {
    let (bus, history) = new_event_bus_with_history::<LedgerEvent>();
    let clock = ManualClock::new(0);
    let ledger = Ledger::from_config(&config, PlaintextBackend, oracle, Arc::new(clock.clone()))?;
    Ok((LedgerActor::setup(ledger, &bus), history, clock))
}

async fn take_types(
    history: &Addr<HistoryCollector<LedgerEvent>>,
    amount: usize,
) -> Result<Vec<LedgerEvent>> {
    timeout(
        Duration::from_secs(10),
        history.send(TakeEvents::new(amount)),
    )
    .await
    .context("timed out waiting for events")?
    .context("history collector unavailable")
}

fn submit(caller: u8, batch_id: BatchId, value: u64) -> Submit<PlainCiphertext> {
    Submit {
        caller: actor(caller),
        batch_id,
        ciphertext: PlaintextBackend.encrypt(value),
    }
}

/// Open, fill from actors 1..=n, close and request. Returns the request id.
async fn requested_batch(
    ledger: &PlainLedger,
    clock: &ManualClock,
    values: &[u64],
) -> Result<(BatchId, RequestId)> {
    let batch_id = ledger.send(OpenBatch { caller: owner() }).await??.batch_id;
    for (i, v) in values.iter().enumerate() {
        ledger.send(submit(i as u8 + 1, batch_id, *v)).await??;
    }
    clock.advance(5);
    ledger
        .send(CloseBatch {
            caller: owner(),
            batch_id,
        })
        .await??;
    clock.advance(5);
    let issued = ledger
        .send(RequestDecryption {
            caller: owner(),
            batch_id,
        })
        .await??;
    Ok((batch_id, issued.requested.request_id))
}

#[actix::test]
async fn test_submitting_then_opening_inside_the_cooldown() -> Result<()> {
    let (ledger, _, clock) = start_with(
        config_with_providers(&[actor(9)]),
        Arc::new(StubOracle::new()),
    )?;
    let batch_id = ledger.send(OpenBatch { caller: owner() }).await??.batch_id;
    ledger.send(submit(9, batch_id, 1)).await??;

    clock.advance(1);
    let res = ledger.send(OpenBatch { caller: actor(9) }).await?;
    assert!(matches!(
        res,
        Err(LedgerError::CooldownActive { remaining: 4 })
    ));
    Ok(())
}

#[actix::test]
async fn test_second_submission_from_the_same_actor() -> Result<()> {
    let (ledger, _, _) = start_with(LedgerConfig::default(), Arc::new(StubOracle::new()))?;
    let batch_id = ledger.send(OpenBatch { caller: owner() }).await??.batch_id;
    ledger.send(submit(1, batch_id, 1)).await??;

    let res = ledger.send(submit(1, batch_id, 1)).await?;
    assert!(matches!(res, Err(LedgerError::CooldownActive { .. })));
    Ok(())
}

#[actix::test]
async fn test_duplicate_submission_after_cooldown() -> Result<()> {
    let (ledger, _, clock) = start_with(LedgerConfig::default(), Arc::new(StubOracle::new()))?;
    let batch_id = ledger.send(OpenBatch { caller: owner() }).await??.batch_id;
    ledger.send(submit(1, batch_id, 1)).await??;
    clock.advance(5);
    let res = ledger.send(submit(1, batch_id, 1)).await?;
    assert!(matches!(res, Err(LedgerError::InvalidBatch { .. })));
    Ok(())
}

#[actix::test]
async fn test_replayed_callback_is_rejected() -> Result<()> {
    let oracle = StubOracle::new();
    let (ledger, history, clock) = start_with(LedgerConfig::default(), Arc::new(oracle.clone()))?;
    let (_, request_id) = requested_batch(&ledger, &clock, &[4, 6]).await?;
    take_types(&history, 5).await?;

    oracle.answer(request_id, 10)?;
    let events = take_types(&history, 1).await?;
    assert_eq!(events[0].event_type(), "DecryptionComplete");

    let replay = ledger
        .send(DecryptionCallback {
            request_id,
            cleartexts: encode_cleartexts(&[10]),
            proof: ArcBytes::from_bytes(b"stub-proof"),
        })
        .await?;
    let err = replay.err().context("replay should be rejected")?;
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::AlreadyProcessed(_))
    ));

    let events = take_types(&history, 1).await?;
    assert_eq!(
        events[0].as_error().map(|e| e.err_type),
        Some(TallyErrorType::State)
    );
    Ok(())
}

/// Verifies real signatures but leaves answering to the test.
struct SilentOracle {
    verifier: ProofVerifier,
    next_id: AtomicU64,
}

impl DecryptionOracle for SilentOracle {
    fn request_decryption(
        &self,
        _: Vec<ArcBytes>,
        _: Recipient<DecryptionCallback>,
    ) -> Result<RequestId> {
        Ok(RequestId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn verify_proof(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> Result<()> {
        self.verifier.verify(request_id, cleartexts, proof)
    }
}

#[actix::test]
async fn test_forged_proof_is_an_integrity_error() -> Result<()> {
    let signer = PrivateKeySigner::random();
    let oracle = SilentOracle {
        verifier: ProofVerifier::new(signer.address()),
        next_id: AtomicU64::new(0),
    };
    let (ledger, history, clock) = start_with(LedgerConfig::default(), Arc::new(oracle))?;
    let (_, request_id) = requested_batch(&ledger, &clock, &[7]).await?;

    let impostor = PrivateKeySigner::random();
    let inflated = encode_cleartexts(&[1_000]);
    let forged = ledger
        .send(DecryptionCallback {
            request_id,
            proof: sign_cleartexts(&impostor, request_id, &inflated)?,
            cleartexts: inflated,
        })
        .await?;
    let err = forged.err().context("forged proof should be rejected")?;
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InvalidProof { .. })
    ));

    let genuine = encode_cleartexts(&[7]);
    ledger
        .send(DecryptionCallback {
            request_id,
            proof: sign_cleartexts(&signer, request_id, &genuine)?,
            cleartexts: genuine,
        })
        .await??;

    let events = take_types(&history, 6).await?;
    assert_eq!(
        events[4].as_error().map(|e| e.err_type),
        Some(TallyErrorType::Integrity)
    );
    let LedgerEvent::DecryptionComplete { data, .. } = &events[5] else {
        anyhow::bail!("expected DecryptionComplete, got {}", events[5].event_type());
    };
    assert_eq!(data.aggregate, 7);
    Ok(())
}

#[actix::test]
async fn test_pending_requests_are_bounded() -> Result<()> {
    let oracle = StubOracle::new();
    let config = LedgerConfig {
        max_pending_requests: Some(1),
        ..LedgerConfig::default()
    };
    let (ledger, history, clock) = start_with(config, Arc::new(oracle.clone()))?;
    let (batch_id, first) = requested_batch(&ledger, &clock, &[1]).await?;

    clock.advance(5);
    let second = ledger
        .send(RequestDecryption {
            caller: owner(),
            batch_id,
        })
        .await??;
    assert_eq!(second.evicted.len(), 1);

    let events = take_types(&history, 6).await?;
    let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        &types[3..],
        &[
            "DecryptionRequested",
            "DecryptionRequested",
            "DecryptionRequestEvicted"
        ]
    );

    oracle.answer(first, 1)?;
    let events = take_types(&history, 1).await?;
    assert_eq!(
        events[0].as_error().map(|e| e.err_type),
        Some(TallyErrorType::Integrity)
    );

    oracle.answer(second.requested.request_id, 1)?;
    let events = take_types(&history, 1).await?;
    assert_eq!(events[0].event_type(), "DecryptionComplete");
    Ok(())
}

#[actix::test]
async fn test_provider_roles() -> Result<()> {
    let (ledger, history, clock) =
        start_with(LedgerConfig::default(), Arc::new(StubOracle::new()))?;

    let res = ledger.send(OpenBatch { caller: actor(2) }).await?;
    assert!(matches!(res, Err(LedgerError::NotProvider { .. })));

    let res = ledger
        .send(AddProvider {
            caller: actor(2),
            provider: actor(2),
        })
        .await?;
    assert!(matches!(res, Err(LedgerError::NotOwner { .. })));

    ledger
        .send(AddProvider {
            caller: owner(),
            provider: actor(2),
        })
        .await??;
    clock.advance(5);
    ledger.send(OpenBatch { caller: actor(2) }).await??;

    let events = take_types(&history, 2).await?;
    let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["ProviderAdded", "BatchOpened"]);
    Ok(())
}

#[test]
fn test_fingerprints_are_bound_to_the_ledger_identity() {
    let state = vec![ArcBytes::from_bytes(&[1, 2, 3])];
    let here = fingerprint(&identity(), &state);
    let elsewhere = fingerprint(&actor(0xee), &state);
    assert_ne!(here, elsewhere);
}
