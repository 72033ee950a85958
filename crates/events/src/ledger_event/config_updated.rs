// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Cooldown interval changed. Values are in seconds.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct CooldownUpdated {
    pub old_value: u64,
    pub new_value: u64,
}

impl Display for CooldownUpdated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "old_value: {}s, new_value: {}s", self.old_value, self.new_value)
    }
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct MaxBatchSizeUpdated {
    pub old_value: u64,
    pub new_value: u64,
}

impl Display for MaxBatchSizeUpdated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "old_value: {}, new_value: {}", self.old_value, self.new_value)
    }
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct ModelVersionUpdated {
    pub old_value: u64,
    pub new_value: u64,
}

impl Display for ModelVersionUpdated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "old_value: {}, new_value: {}", self.old_value, self.new_value)
    }
}
