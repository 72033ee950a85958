// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod access;
mod batch;
mod config_updated;
mod decryption;
mod tally_error;

pub use access::*;
pub use batch::*;
pub use config_updated::*;
pub use decryption::*;
pub use tally_error::*;

use crate::{BatchId, ErrorEvent, Event, EventId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Declares `LedgerEvent` with one `{ id, data }` variant per payload type together with the
/// `From` conversions, id extraction and type naming the bus relies on.
macro_rules! ledger_events {
    ($($variant:ident),* $(,)?) => {
        #[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[rtype(result = "()")]
        pub enum LedgerEvent {
            $(
                $variant {
                    id: EventId,
                    data: $variant,
                },
            )*
        }

        $(
            impl From<$variant> for LedgerEvent {
                fn from(data: $variant) -> Self {
                    LedgerEvent::$variant {
                        id: EventId::fresh(&data),
                        data,
                    }
                }
            }
        )*

        impl LedgerEvent {
            pub fn get_id(&self) -> EventId {
                match self {
                    $(LedgerEvent::$variant { id, .. } => id.clone(),)*
                }
            }

            pub fn event_type(&self) -> String {
                match self {
                    $(LedgerEvent::$variant { .. } => stringify!($variant).to_string(),)*
                }
            }

            pub fn get_data(&self) -> String {
                match self {
                    $(LedgerEvent::$variant { data, .. } => format!("{}", data),)*
                }
            }
        }
    };
}

ledger_events!(
    ProviderAdded,
    ProviderRemoved,
    Paused,
    Unpaused,
    CooldownUpdated,
    MaxBatchSizeUpdated,
    ModelVersionUpdated,
    BatchOpened,
    BatchClosed,
    Submission,
    DecryptionRequested,
    DecryptionComplete,
    DecryptionRequestEvicted,
    TallyError,
);

impl LedgerEvent {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// The batch this event concerns, if any.
    pub fn batch_id(&self) -> Option<BatchId> {
        match self {
            LedgerEvent::BatchOpened { data, .. } => Some(data.batch_id),
            LedgerEvent::BatchClosed { data, .. } => Some(data.batch_id),
            LedgerEvent::Submission { data, .. } => Some(data.batch_id),
            LedgerEvent::DecryptionRequested { data, .. } => Some(data.batch_id),
            LedgerEvent::DecryptionComplete { data, .. } => Some(data.batch_id),
            LedgerEvent::DecryptionRequestEvicted { data, .. } => Some(data.batch_id),
            _ => None,
        }
    }
}

impl Event for LedgerEvent {
    type Id = EventId;

    fn event_type(&self) -> String {
        LedgerEvent::event_type(self)
    }

    fn event_id(&self) -> Self::Id {
        self.get_id()
    }
}

impl ErrorEvent for LedgerEvent {
    type Error = TallyError;
    type ErrorType = TallyErrorType;

    fn as_error(&self) -> Option<&Self::Error> {
        match self {
            LedgerEvent::TallyError { data, .. } => Some(data),
            _ => None,
        }
    }

    fn from_error(err_type: Self::ErrorType, error: impl Display) -> Self {
        LedgerEvent::from(TallyError::new(err_type, error.to_string()))
    }
}

impl Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.event_type(), self.get_data())
    }
}
