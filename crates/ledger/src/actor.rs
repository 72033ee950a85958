// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    BatchSnapshot, ConfigStore, DecryptionIssued, DecryptionRequest, Ledger, LedgerError,
};
use actix::{Actor, Addr, AsyncContext, Context, Handler, Message, MessageResult};
use alloy_primitives::Address;
use tally_events::{
    BatchClosed, BatchId, BatchOpened, CooldownUpdated, ErrorEvent, EventBus, LedgerEvent,
    MaxBatchSizeUpdated, ModelVersionUpdated, Paused, ProviderAdded, ProviderRemoved, RequestId,
    Submission, Unpaused,
};
use tally_fhe::HomomorphicBackend;
use tally_oracle::DecryptionCallback;
use tracing::{error, warn};

/// Actor owning one [`Ledger`]. Messages are handled one at a time, which is what serializes
/// every mutation of the ledger. Successful operations are published on the event bus.
pub struct LedgerActor<B: HomomorphicBackend> {
    ledger: Ledger<B>,
    bus: Addr<EventBus<LedgerEvent>>,
}

impl<B: HomomorphicBackend> LedgerActor<B> {
    pub fn new(ledger: Ledger<B>, bus: &Addr<EventBus<LedgerEvent>>) -> Self {
        Self {
            ledger,
            bus: bus.clone(),
        }
    }

    pub fn setup(ledger: Ledger<B>, bus: &Addr<EventBus<LedgerEvent>>) -> Addr<Self> {
        Self::new(ledger, bus).start()
    }

    fn publish(&self, event: impl Into<LedgerEvent>) {
        self.bus.do_send(event.into());
    }

    /// Publish the event of a successful operation, log a rejected one.
    fn settle<T>(&self, op: &str, result: Result<T, LedgerError>) -> Result<T, LedgerError>
    where
        T: Clone + Into<LedgerEvent>,
    {
        match result {
            Ok(event) => {
                self.publish(event.clone());
                Ok(event)
            }
            Err(err) => {
                warn!(op, kind = ?err.kind(), "Rejected: {err}");
                Err(err)
            }
        }
    }
}

impl<B: HomomorphicBackend> Actor for LedgerActor<B> {
    type Context = Context<Self>;
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Paused, LedgerError>")]
pub struct Pause {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Unpaused, LedgerError>")]
pub struct Unpause {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<ProviderAdded, LedgerError>")]
pub struct AddProvider {
    pub caller: Address,
    pub provider: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<ProviderRemoved, LedgerError>")]
pub struct RemoveProvider {
    pub caller: Address,
    pub provider: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<CooldownUpdated, LedgerError>")]
pub struct SetCooldownInterval {
    pub caller: Address,
    pub value: u64,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<MaxBatchSizeUpdated, LedgerError>")]
pub struct SetMaxBatchSize {
    pub caller: Address,
    pub value: u64,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<ModelVersionUpdated, LedgerError>")]
pub struct SetModelVersion {
    pub caller: Address,
    pub value: u64,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<BatchOpened, LedgerError>")]
pub struct OpenBatch {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<BatchClosed, LedgerError>")]
pub struct CloseBatch {
    pub caller: Address,
    pub batch_id: BatchId,
}

#[derive(Clone, Debug)]
pub struct Submit<C> {
    pub caller: Address,
    pub batch_id: BatchId,
    pub ciphertext: C,
}

impl<C: 'static> Message for Submit<C> {
    type Result = Result<Submission, LedgerError>;
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<DecryptionIssued, LedgerError>")]
pub struct RequestDecryption {
    pub caller: Address,
    pub batch_id: BatchId,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<BatchSnapshot>")]
pub struct GetBatch(pub BatchId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<DecryptionRequest>")]
pub struct GetDecryptionRequest(pub RequestId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "bool")]
pub struct IsOwner(pub Address);

#[derive(Message, Clone, Debug)]
#[rtype(result = "bool")]
pub struct IsProvider(pub Address);

#[derive(Message, Clone, Debug)]
#[rtype(result = "bool")]
pub struct IsPaused;

#[derive(Message, Clone, Debug)]
#[rtype(result = "ConfigStore")]
pub struct GetSettings;

impl<B: HomomorphicBackend> Handler<Pause> for LedgerActor<B> {
    type Result = Result<Paused, LedgerError>;
    fn handle(&mut self, msg: Pause, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.pause(msg.caller);
        self.settle("pause", result)
    }
}

impl<B: HomomorphicBackend> Handler<Unpause> for LedgerActor<B> {
    type Result = Result<Unpaused, LedgerError>;
    fn handle(&mut self, msg: Unpause, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.unpause(msg.caller);
        self.settle("unpause", result)
    }
}

impl<B: HomomorphicBackend> Handler<AddProvider> for LedgerActor<B> {
    type Result = Result<ProviderAdded, LedgerError>;
    fn handle(&mut self, msg: AddProvider, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.add_provider(msg.caller, msg.provider);
        self.settle("add_provider", result)
    }
}

impl<B: HomomorphicBackend> Handler<RemoveProvider> for LedgerActor<B> {
    type Result = Result<ProviderRemoved, LedgerError>;
    fn handle(&mut self, msg: RemoveProvider, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.remove_provider(msg.caller, msg.provider);
        self.settle("remove_provider", result)
    }
}

impl<B: HomomorphicBackend> Handler<SetCooldownInterval> for LedgerActor<B> {
    type Result = Result<CooldownUpdated, LedgerError>;
    fn handle(&mut self, msg: SetCooldownInterval, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.set_cooldown_interval(msg.caller, msg.value);
        self.settle("set_cooldown_interval", result)
    }
}

impl<B: HomomorphicBackend> Handler<SetMaxBatchSize> for LedgerActor<B> {
    type Result = Result<MaxBatchSizeUpdated, LedgerError>;
    fn handle(&mut self, msg: SetMaxBatchSize, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.set_max_batch_size(msg.caller, msg.value);
        self.settle("set_max_batch_size", result)
    }
}

impl<B: HomomorphicBackend> Handler<SetModelVersion> for LedgerActor<B> {
    type Result = Result<ModelVersionUpdated, LedgerError>;
    fn handle(&mut self, msg: SetModelVersion, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.set_model_version(msg.caller, msg.value);
        self.settle("set_model_version", result)
    }
}

impl<B: HomomorphicBackend> Handler<OpenBatch> for LedgerActor<B> {
    type Result = Result<BatchOpened, LedgerError>;
    fn handle(&mut self, msg: OpenBatch, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.open_batch(msg.caller);
        self.settle("open_batch", result)
    }
}

impl<B: HomomorphicBackend> Handler<CloseBatch> for LedgerActor<B> {
    type Result = Result<BatchClosed, LedgerError>;
    fn handle(&mut self, msg: CloseBatch, _: &mut Self::Context) -> Self::Result {
        let result = self.ledger.close_batch(msg.caller, msg.batch_id);
        self.settle("close_batch", result)
    }
}

impl<B: HomomorphicBackend> Handler<Submit<B::Ciphertext>> for LedgerActor<B> {
    type Result = Result<Submission, LedgerError>;
    fn handle(&mut self, msg: Submit<B::Ciphertext>, _: &mut Self::Context) -> Self::Result {
        let result = self
            .ledger
            .submit(msg.caller, msg.batch_id, &msg.ciphertext);
        self.settle("submit", result)
    }
}

impl<B: HomomorphicBackend> Handler<RequestDecryption> for LedgerActor<B> {
    type Result = Result<DecryptionIssued, LedgerError>;
    fn handle(&mut self, msg: RequestDecryption, ctx: &mut Self::Context) -> Self::Result {
        let callback = ctx.address().recipient();
        match self
            .ledger
            .request_decryption(msg.caller, msg.batch_id, callback)
        {
            Ok(issued) => {
                self.publish(issued.requested.clone());
                for evicted in &issued.evicted {
                    self.publish(evicted.clone());
                }
                Ok(issued)
            }
            Err(err) => {
                warn!(op = "request_decryption", kind = ?err.kind(), "Rejected: {err}");
                Err(err)
            }
        }
    }
}

impl<B: HomomorphicBackend> Handler<DecryptionCallback> for LedgerActor<B> {
    type Result = anyhow::Result<()>;
    fn handle(&mut self, msg: DecryptionCallback, _: &mut Self::Context) -> Self::Result {
        match self
            .ledger
            .on_decryption_callback(msg.request_id, &msg.cleartexts, &msg.proof)
        {
            Ok(complete) => {
                self.publish(complete);
                Ok(())
            }
            Err(err) => {
                error!(request_id = %msg.request_id, kind = ?err.kind(), "Decryption callback rejected: {err}");
                self.bus
                    .do_send(LedgerEvent::from_error(err.kind().into(), &err));
                Err(err.into())
            }
        }
    }
}

impl<B: HomomorphicBackend> Handler<GetBatch> for LedgerActor<B> {
    type Result = Option<BatchSnapshot>;
    fn handle(&mut self, msg: GetBatch, _: &mut Self::Context) -> Self::Result {
        self.ledger.batch(msg.0)
    }
}

impl<B: HomomorphicBackend> Handler<GetDecryptionRequest> for LedgerActor<B> {
    type Result = Option<DecryptionRequest>;
    fn handle(&mut self, msg: GetDecryptionRequest, _: &mut Self::Context) -> Self::Result {
        self.ledger.decryption_request(msg.0)
    }
}

impl<B: HomomorphicBackend> Handler<IsOwner> for LedgerActor<B> {
    type Result = bool;
    fn handle(&mut self, msg: IsOwner, _: &mut Self::Context) -> Self::Result {
        self.ledger.is_owner(&msg.0)
    }
}

impl<B: HomomorphicBackend> Handler<IsProvider> for LedgerActor<B> {
    type Result = bool;
    fn handle(&mut self, msg: IsProvider, _: &mut Self::Context) -> Self::Result {
        self.ledger.is_provider(&msg.0)
    }
}

impl<B: HomomorphicBackend> Handler<IsPaused> for LedgerActor<B> {
    type Result = bool;
    fn handle(&mut self, _: IsPaused, _: &mut Self::Context) -> Self::Result {
        self.ledger.is_paused()
    }
}

impl<B: HomomorphicBackend> Handler<GetSettings> for LedgerActor<B> {
    type Result = MessageResult<GetSettings>;
    fn handle(&mut self, _: GetSettings, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.ledger.settings())
    }
}
