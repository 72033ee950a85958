// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Context, Handler, Recipient};
use tally_oracle::DecryptionCallback;

/// Stands in for a ledger when only the callback address matters. Answers are dropped.
pub struct CallbackSink;

impl CallbackSink {
    pub fn recipient() -> Recipient<DecryptionCallback> {
        Self.start().recipient()
    }
}

impl Actor for CallbackSink {
    type Context = Context<Self>;
}

impl Handler<DecryptionCallback> for CallbackSink {
    type Result = anyhow::Result<()>;
    fn handle(&mut self, _: DecryptionCallback, _: &mut Self::Context) -> Self::Result {
        Ok(())
    }
}
