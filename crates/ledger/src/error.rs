// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use tally_events::{BatchId, RequestId, TallyErrorType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{actor} is not the owner")]
    NotOwner { actor: Address },

    #[error("{actor} is not a provider")]
    NotProvider { actor: Address },

    #[error("Ledger is paused")]
    Paused,

    #[error("Ledger is not paused")]
    NotPaused,

    #[error("{0} is not open")]
    BatchClosed(BatchId),

    #[error("Invalid {batch_id}: {reason}")]
    InvalidBatch {
        batch_id: BatchId,
        reason: &'static str,
    },

    #[error("{batch_id} is full ({max} submissions)")]
    BatchFull { batch_id: BatchId, max: u64 },

    #[error("{0} was already processed")]
    AlreadyProcessed(RequestId),

    #[error("Submitted value is not an initialized ciphertext")]
    InvalidCiphertext,

    #[error("Cooldown active, {remaining}s remaining")]
    CooldownActive { remaining: u64 },

    #[error("Ciphertext state for {0} no longer matches its fingerprint")]
    InvalidStateHash(RequestId),

    #[error("Invalid proof for {request_id}: {reason}")]
    InvalidProof {
        request_id: RequestId,
        reason: String,
    },

    #[error("Unknown decryption request {0}")]
    UnknownRequest(RequestId),

    #[error("Malformed cleartexts: {0}")]
    InvalidCleartext(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authorization,
    State,
    Rate,
    Integrity,
    Config,
    Backend,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            NotOwner { .. } | NotProvider { .. } => ErrorKind::Authorization,
            Paused
            | NotPaused
            | BatchClosed(_)
            | InvalidBatch { .. }
            | BatchFull { .. }
            | AlreadyProcessed(_)
            | InvalidCiphertext => ErrorKind::State,
            CooldownActive { .. } => ErrorKind::Rate,
            InvalidStateHash(_) | InvalidProof { .. } | UnknownRequest(_) | InvalidCleartext(_) => {
                ErrorKind::Integrity
            }
            InvalidConfig(_) => ErrorKind::Config,
            Backend(_) => ErrorKind::Backend,
        }
    }
}

impl From<ErrorKind> for TallyErrorType {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::Authorization => TallyErrorType::Authorization,
            ErrorKind::State => TallyErrorType::State,
            ErrorKind::Rate => TallyErrorType::Rate,
            ErrorKind::Integrity => TallyErrorType::Integrity,
            ErrorKind::Config => TallyErrorType::Config,
            ErrorKind::Backend => TallyErrorType::Backend,
        }
    }
}
