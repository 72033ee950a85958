// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::prelude::*;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context as _, Result};
use std::{sync::Arc, time::Duration};
use tally_config::LedgerConfig;
use tally_events::{
    new_event_bus_with_history, BatchId, HistoryCollector, LedgerEvent, TakeEvents,
};
use tally_fhe::{
    create_shared_rng_from_u64, generate_bfv_keys, BfvParamSet, CiphertextDecryptor,
    HomomorphicBackend, PlaintextBackend, PlaintextDecryptor,
};
use tally_ledger::{
    CloseBatch, GetBatch, GetDecryptionRequest, Ledger, LedgerActor, LedgerError, ManualClock,
    OpenBatch, RequestDecryption, Submit,
};
use tally_logger::SimpleLogger;
use tally_oracle::LocalOracle;
use tally_test_helpers::{actor, init_test_tracing, owner};
use tokio::time::timeout;

struct LocalSystem<B: HomomorphicBackend> {
    ledger: Addr<LedgerActor<B>>,
    history: Addr<HistoryCollector<LedgerEvent>>,
    clock: ManualClock,
}

fn start<B: HomomorphicBackend>(
    backend: B,
    decryptor: Arc<dyn CiphertextDecryptor>,
) -> Result<LocalSystem<B>> {
    init_test_tracing();
    let (bus, history) = new_event_bus_with_history::<LedgerEvent>();
    SimpleLogger::<LedgerEvent>::attach("test", bus.clone());
    let oracle = LocalOracle::setup(decryptor, PrivateKeySigner::random());
    let clock = ManualClock::new(1_700_000_000);
    let ledger = Ledger::from_config(
        &LedgerConfig::default(),
        backend,
        Arc::new(oracle),
        Arc::new(clock.clone()),
    )?;
    Ok(LocalSystem {
        ledger: LedgerActor::setup(ledger, &bus),
        history,
        clock,
    })
}

async fn take_events(
    history: &Addr<HistoryCollector<LedgerEvent>>,
    amount: usize,
) -> Result<Vec<LedgerEvent>> {
    timeout(
        Duration::from_secs(30),
        history.send(TakeEvents::new(amount)),
    )
    .await
    .context("timed out waiting for events")?
    .context("history collector unavailable")
}

/// Open a batch, submit each ciphertext from its own participant, close it and request its
/// decryption.
async fn run_batch<B: HomomorphicBackend>(
    system: &LocalSystem<B>,
    ciphertexts: Vec<B::Ciphertext>,
) -> Result<BatchId> {
    let batch_id = system
        .ledger
        .send(OpenBatch { caller: owner() })
        .await??
        .batch_id;

    for (i, ciphertext) in ciphertexts.into_iter().enumerate() {
        system
            .ledger
            .send(Submit {
                caller: actor(i as u8 + 1),
                batch_id,
                ciphertext,
            })
            .await??;
    }

    system.clock.advance(5);
    system
        .ledger
        .send(CloseBatch {
            caller: owner(),
            batch_id,
        })
        .await??;

    system.clock.advance(5);
    system
        .ledger
        .send(RequestDecryption {
            caller: owner(),
            batch_id,
        })
        .await??;

    Ok(batch_id)
}

#[actix::test]
async fn test_plaintext_aggregation_and_decryption() -> Result<()> {
    let system = start(PlaintextBackend, Arc::new(PlaintextDecryptor))?;
    let ciphertexts = [2, 3, 5].map(|v| PlaintextBackend.encrypt(v)).to_vec();
    let batch_id = run_batch(&system, ciphertexts).await?;

    let events = take_events(&system.history, 7).await?;
    let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "BatchOpened",
            "Submission",
            "Submission",
            "Submission",
            "BatchClosed",
            "DecryptionRequested",
            "DecryptionComplete"
        ]
    );

    let Some(LedgerEvent::DecryptionComplete { data, .. }) = events.last() else {
        bail!("expected DecryptionComplete");
    };
    assert_eq!(data.batch_id, batch_id);
    assert_eq!(data.aggregate, 10);

    let request = system
        .ledger
        .send(GetDecryptionRequest(data.request_id))
        .await?
        .context("request recorded")?;
    assert!(request.processed);
    Ok(())
}

#[actix::test]
async fn test_bfv_aggregation_and_decryption() -> Result<()> {
    let rng = create_shared_rng_from_u64(42);
    let (backend, decryptor) = generate_bfv_keys(&BfvParamSet::default(), &rng)?;
    let client = backend.clone();
    let system = start(backend, Arc::new(decryptor))?;

    let ciphertexts = [2, 3, 5]
        .into_iter()
        .map(|v| client.encrypt(v))
        .collect::<Result<Vec<_>>>()?;
    let batch_id = run_batch(&system, ciphertexts).await?;

    let events = take_events(&system.history, 7).await?;

    // submissions carry ciphertext handles, never the submitted values
    for event in &events {
        if let LedgerEvent::Submission { data, .. } = event {
            assert!(data.ciphertext_handle.len() > 32);
        }
    }

    let Some(LedgerEvent::DecryptionComplete { data, .. }) = events.last() else {
        bail!("expected DecryptionComplete, got {:?}", events.last());
    };
    assert_eq!(data.batch_id, batch_id);
    assert_eq!(data.aggregate, 10);

    let batch = system
        .ledger
        .send(GetBatch(batch_id))
        .await?
        .context("batch is kept after decryption")?;
    assert!(!batch.open);
    assert_eq!(batch.submissions, 3);
    Ok(())
}

#[actix::test]
async fn test_empty_batch_cannot_be_decrypted() -> Result<()> {
    let system = start(PlaintextBackend, Arc::new(PlaintextDecryptor))?;
    let err = run_batch(&system, vec![])
        .await
        .err()
        .context("empty batch should be rejected")?;
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InvalidBatch { .. })
    ));

    let events = take_events(&system.history, 2).await?;
    let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["BatchOpened", "BatchClosed"]);
    Ok(())
}

#[actix::test]
async fn test_next_model_version_opens_a_new_batch() -> Result<()> {
    let system = start(PlaintextBackend, Arc::new(PlaintextDecryptor))?;
    let first = run_batch(&system, vec![PlaintextBackend.encrypt(1)]).await?;
    take_events(&system.history, 5).await?;

    // closed batches are terminal
    system.clock.advance(5);
    let reopened = system.ledger.send(OpenBatch { caller: owner() }).await?;
    assert!(matches!(reopened, Err(LedgerError::InvalidBatch { .. })));

    system
        .ledger
        .send(tally_ledger::SetModelVersion {
            caller: owner(),
            value: 2,
        })
        .await??;
    system.clock.advance(5);
    let second = run_batch(&system, vec![PlaintextBackend.encrypt(4)]).await?;
    assert_ne!(first, second);
    assert_eq!(second, BatchId::new(2));

    let events = take_events(&system.history, 6).await?;
    let Some(LedgerEvent::DecryptionComplete { data, .. }) = events.last() else {
        bail!("expected DecryptionComplete, got {:?}", events.last());
    };
    assert_eq!(data.batch_id, second);
    assert_eq!(data.aggregate, 4);
    Ok(())
}
