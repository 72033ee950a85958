// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Addr;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tally_config::{FheBackendKind, LedgerConfig};
use tally_events::{
    new_event_bus_with_history, DecryptionComplete, HistoryCollector, LedgerEvent, TakeEvents,
};
use tally_fhe::{
    create_shared_rng_from_entropy, generate_bfv_keys, BfvParamSet, CiphertextDecryptor,
    HomomorphicBackend, PlaintextBackend, PlaintextDecryptor,
};
use tally_ledger::{
    Clock, CloseBatch, Ledger, LedgerActor, ManualClock, OpenBatch, RequestDecryption, Submit,
    SystemClock,
};
use tally_logger::SimpleLogger;
use tally_oracle::{LocalOracle, ProofVerifier};
use tokio::time::timeout;
use tracing::info;

const DECRYPTION_TIMEOUT: Duration = Duration::from_secs(60);

pub async fn execute(
    config: LedgerConfig,
    values: Vec<u64>,
    backend: Option<FheBackendKind>,
) -> Result<()> {
    let kind = backend.unwrap_or(config.oracle.fhe);
    info!(backend = ?kind, submissions = values.len(), "Starting simulation");

    let complete = match kind {
        FheBackendKind::Plaintext => {
            run(&config, &values, PlaintextBackend, Arc::new(PlaintextDecryptor), |v| {
                Ok(PlaintextBackend.encrypt(v))
            })
            .await?
        }
        FheBackendKind::Bfv => {
            let rng = create_shared_rng_from_entropy();
            let (backend, decryptor) = generate_bfv_keys(&BfvParamSet::default(), &rng)?;
            let backend = backend.with_max_addends(config.max_batch_size);
            let client = backend.clone();
            run(&config, &values, backend, Arc::new(decryptor), move |v| {
                client.encrypt(v)
            })
            .await?
        }
    };

    println!(
        "Aggregate of {} submissions in {}: {}",
        values.len(),
        complete.batch_id,
        complete.aggregate
    );
    Ok(())
}

/// Participant addresses are 1, 2, 3... skipping the owner.
fn participant(index: usize, owner: &Address) -> Address {
    let address = Address::left_padding_from(&(index as u64 + 1).to_be_bytes());
    if address == *owner {
        Address::left_padding_from(&u64::MAX.to_be_bytes())
    } else {
        address
    }
}

async fn run<B: HomomorphicBackend>(
    config: &LedgerConfig,
    values: &[u64],
    backend: B,
    decryptor: Arc<dyn CiphertextDecryptor>,
    encrypt: impl Fn(u64) -> Result<B::Ciphertext>,
) -> Result<DecryptionComplete> {
    let signer = PrivateKeySigner::random();
    let verifier = ProofVerifier::new(config.oracle.address.unwrap_or(signer.address()));

    let (bus, history) = new_event_bus_with_history::<LedgerEvent>();
    SimpleLogger::<LedgerEvent>::attach("tally", bus.clone());

    let oracle = LocalOracle::setup_with_verifier(decryptor, signer, verifier);
    info!(oracle = %oracle.verifier().oracle(), "Trusting decryption proofs");
    let clock = ManualClock::new(SystemClock.now());
    let ledger = Ledger::from_config(config, backend, Arc::new(oracle), Arc::new(clock.clone()))?;
    let ledger = LedgerActor::setup(ledger, &bus);
    let owner = config.owner;

    let batch_id = ledger.send(OpenBatch { caller: owner }).await??.batch_id;
    for (i, value) in values.iter().enumerate() {
        ledger
            .send(Submit {
                caller: participant(i, &owner),
                batch_id,
                ciphertext: encrypt(*value)?,
            })
            .await??;
    }

    clock.advance(config.cooldown_interval_secs);
    ledger
        .send(CloseBatch {
            caller: owner,
            batch_id,
        })
        .await??;

    clock.advance(config.cooldown_interval_secs);
    ledger
        .send(RequestDecryption {
            caller: owner,
            batch_id,
        })
        .await??;

    timeout(DECRYPTION_TIMEOUT, wait_for_completion(&history))
        .await
        .context("Timed out waiting for the oracle")?
}

async fn wait_for_completion(
    history: &Addr<HistoryCollector<LedgerEvent>>,
) -> Result<DecryptionComplete> {
    loop {
        for event in history.send(TakeEvents::new(1)).await? {
            match event {
                LedgerEvent::DecryptionComplete { data, .. } => return Ok(data),
                LedgerEvent::TallyError { data, .. } => bail!("Decryption failed: {data}"),
                _ => {}
            }
        }
    }
}
