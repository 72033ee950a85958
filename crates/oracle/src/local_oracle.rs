// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    encode_cleartexts, sign_cleartexts, DecryptionCallback, DecryptionOracle, ProofVerifier,
};
use actix::{Actor, Addr, Context, Handler, Message, Recipient};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Result};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tally_events::RequestId;
use tally_fhe::CiphertextDecryptor;
use tally_utils::ArcBytes;
use tracing::{error, info, warn};

#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct DecryptionJob {
    pub request_id: RequestId,
    pub handles: Vec<ArcBytes>,
    pub callback: Recipient<DecryptionCallback>,
}

/// In-process oracle holding the decryption key and a signing key.
///
/// Jobs are answered asynchronously through the job's callback recipient. A job that cannot be
/// decrypted gets no answer, the request simply stays pending on the ledger.
pub struct LocalOracle {
    decryptor: Arc<dyn CiphertextDecryptor>,
    signer: PrivateKeySigner,
}

impl LocalOracle {
    pub fn new(decryptor: Arc<dyn CiphertextDecryptor>, signer: PrivateKeySigner) -> Self {
        Self { decryptor, signer }
    }

    /// Start an oracle whose proofs are checked against its own signing key.
    pub fn setup(
        decryptor: Arc<dyn CiphertextDecryptor>,
        signer: PrivateKeySigner,
    ) -> LocalOracleHandle {
        let verifier = ProofVerifier::new(signer.address());
        Self::setup_with_verifier(decryptor, signer, verifier)
    }

    /// Start an oracle whose proofs are checked by `verifier`. Answers signed by any key other
    /// than the verifier's oracle address are rejected by the ledger.
    pub fn setup_with_verifier(
        decryptor: Arc<dyn CiphertextDecryptor>,
        signer: PrivateKeySigner,
        verifier: ProofVerifier,
    ) -> LocalOracleHandle {
        if verifier.oracle() != signer.address() {
            warn!(
                signer = %signer.address(),
                trusted = %verifier.oracle(),
                "Local oracle key is not the trusted oracle address, its proofs will be rejected"
            );
        }
        let addr = LocalOracle::new(decryptor, signer).start();
        LocalOracleHandle::new(addr, verifier)
    }

    fn answer(&self, job: &DecryptionJob) -> Result<DecryptionCallback> {
        let values = job
            .handles
            .iter()
            .map(|handle| self.decryptor.decrypt_handle(handle))
            .collect::<Result<Vec<_>>>()?;
        let cleartexts = encode_cleartexts(&values);
        let proof = sign_cleartexts(&self.signer, job.request_id, &cleartexts)?;
        Ok(DecryptionCallback {
            request_id: job.request_id,
            cleartexts,
            proof,
        })
    }
}

impl Actor for LocalOracle {
    type Context = Context<Self>;
}

impl Handler<DecryptionJob> for LocalOracle {
    type Result = ();
    fn handle(&mut self, msg: DecryptionJob, _: &mut Self::Context) -> Self::Result {
        match self.answer(&msg) {
            Ok(callback) => {
                info!(request_id = %msg.request_id, "Answering decryption request");
                msg.callback.do_send(callback);
            }
            Err(e) => {
                error!(request_id = %msg.request_id, "Decryption failed: {e}");
            }
        }
    }
}

/// Ledger-facing side of a [`LocalOracle`]. Allocates request ids and verifies the oracle's own
/// signatures.
#[derive(Clone)]
pub struct LocalOracleHandle {
    addr: Addr<LocalOracle>,
    next_id: Arc<AtomicU64>,
    verifier: ProofVerifier,
}

impl LocalOracleHandle {
    pub fn new(addr: Addr<LocalOracle>, verifier: ProofVerifier) -> Self {
        Self {
            addr,
            next_id: Arc::new(AtomicU64::new(1)),
            verifier,
        }
    }

    pub fn verifier(&self) -> ProofVerifier {
        self.verifier
    }
}

impl DecryptionOracle for LocalOracleHandle {
    fn request_decryption(
        &self,
        handles: Vec<ArcBytes>,
        callback: Recipient<DecryptionCallback>,
    ) -> Result<RequestId> {
        if handles.is_empty() {
            bail!("Nothing to decrypt");
        }
        let request_id = RequestId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.addr.do_send(DecryptionJob {
            request_id,
            handles,
            callback,
        });
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> Result<()> {
        self.verifier.verify(request_id, cleartexts, proof)
    }
}
