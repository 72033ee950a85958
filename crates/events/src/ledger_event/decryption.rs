// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BatchId, Fingerprint, RequestId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DecryptionRequested {
    pub request_id: RequestId,
    pub batch_id: BatchId,
    pub fingerprint: Fingerprint,
}

impl Display for DecryptionRequested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request_id: {}, batch_id: {}, fingerprint: {}",
            self.request_id, self.batch_id, self.fingerprint
        )
    }
}

/// The only event that ever carries plaintext: the aggregate of a closed batch.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DecryptionComplete {
    pub request_id: RequestId,
    pub batch_id: BatchId,
    pub aggregate: u64,
}

impl Display for DecryptionComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request_id: {}, batch_id: {}, aggregate: {}",
            self.request_id, self.batch_id, self.aggregate
        )
    }
}

/// A pending request was dropped from a bounded request table before its callback arrived.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DecryptionRequestEvicted {
    pub request_id: RequestId,
    pub batch_id: BatchId,
}

impl Display for DecryptionRequestEvicted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request_id: {}, batch_id: {}",
            self.request_id, self.batch_id
        )
    }
}
