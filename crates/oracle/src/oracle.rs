// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Message, Recipient};
use anyhow::Result;
use derivative::Derivative;
use std::fmt::{self, Display};
use tally_events::RequestId;
use tally_utils::ArcBytes;

/// Response an oracle delivers to the ledger that asked for a decryption.
///
/// The reply is the ledger's verdict. Oracles send it fire-and-forget, the ledger reports
/// rejections on its own event bus.
#[derive(Message, Derivative, Clone, PartialEq, Eq)]
#[derivative(Debug)]
#[rtype(result = "anyhow::Result<()>")]
pub struct DecryptionCallback {
    pub request_id: RequestId,
    #[derivative(Debug(format_with = "tally_utils::formatters::hexf"))]
    pub cleartexts: ArcBytes,
    #[derivative(Debug(format_with = "tally_utils::formatters::hexf"))]
    pub proof: ArcBytes,
}

impl Display for DecryptionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request_id: {}, cleartexts: {} bytes, proof: {} bytes",
            self.request_id,
            self.cleartexts.len(),
            self.proof.len()
        )
    }
}

/// External decryption service.
///
/// `request_decryption` returns as soon as the request is accepted. The answer arrives later as a
/// [`DecryptionCallback`] sent to `callback`.
pub trait DecryptionOracle: Send + Sync + 'static {
    fn request_decryption(
        &self,
        handles: Vec<ArcBytes>,
        callback: Recipient<DecryptionCallback>,
    ) -> Result<RequestId>;

    /// Checks that `proof` attests `cleartexts` as the answer to `request_id`.
    fn verify_proof(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> Result<()>;
}
