// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct TallyError {
    pub err_type: TallyErrorType,
    pub message: String,
}

impl Display for TallyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.err_type, self.message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TallyErrorType {
    Authorization,
    State,
    Rate,
    Integrity,
    Config,
    Backend,
}

impl TallyError {
    pub fn new(err_type: TallyErrorType, message: impl Into<String>) -> Self {
        Self {
            err_type,
            message: message.into(),
        }
    }
}
