// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr, Context, Handler};
use std::marker::PhantomData;
use tally_events::{ErrorEvent, Event, EventBus, LedgerEvent, Subscribe};
use tracing::{error, info};

pub trait EventLogging: Event {
    fn log(&self, logger_name: &str);
}

/// Logs everything crossing the bus it is attached to.
pub struct SimpleLogger<E: EventLogging> {
    name: String,
    _p: PhantomData<E>,
}

impl<E: EventLogging> SimpleLogger<E> {
    pub fn attach(name: &str, bus: Addr<EventBus<E>>) -> Addr<Self> {
        let addr = Self {
            name: name.to_owned(),
            _p: PhantomData,
        }
        .start();
        bus.do_send(Subscribe::<E>::new("*", addr.clone().recipient()));
        info!(ledger = %name, "Logger ready");
        addr
    }
}

impl<E: EventLogging> Actor for SimpleLogger<E> {
    type Context = Context<Self>;
}

impl<E: EventLogging> Handler<E> for SimpleLogger<E> {
    type Result = ();

    fn handle(&mut self, msg: E, _: &mut Self::Context) -> Self::Result {
        msg.log(&self.name);
    }
}

impl EventLogging for LedgerEvent {
    fn log(&self, logger_name: &str) {
        if let Some(err) = self.as_error() {
            error!(me = logger_name, err_type = ?err.err_type, "{}", err.message);
            return;
        }
        match self.batch_id() {
            Some(batch_id) => {
                info!(me = logger_name, evt = %self, batch_id = %batch_id, "Event published")
            }
            None => info!(me = logger_name, evt = %self, "Event published"),
        }
    }
}
