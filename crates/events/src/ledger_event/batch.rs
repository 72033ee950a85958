// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::BatchId;
use actix::Message;
use alloy_primitives::Address;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use tally_utils::ArcBytes;

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct BatchOpened {
    pub batch_id: BatchId,
}

impl Display for BatchOpened {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch_id: {}", self.batch_id)
    }
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct BatchClosed {
    pub batch_id: BatchId,
    pub submissions: u64,
}

impl Display for BatchClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batch_id: {}, submissions: {}",
            self.batch_id, self.submissions
        )
    }
}

/// An encrypted contribution was folded into a batch accumulator. Carries only the opaque
/// ciphertext handle.
#[derive(Derivative, Message, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derivative(Debug)]
#[rtype(result = "()")]
pub struct Submission {
    pub actor: Address,
    pub batch_id: BatchId,
    #[derivative(Debug(format_with = "tally_utils::formatters::hexf"))]
    pub ciphertext_handle: ArcBytes,
}

impl Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "actor: {}, batch_id: {}, ciphertext_handle: {}",
            self.actor,
            self.batch_id,
            tally_utils::short_hex(&self.ciphertext_handle)
        )
    }
}
