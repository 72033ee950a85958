// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LedgerError;
use alloy_primitives::Address;
use std::collections::{HashMap, HashSet};
use tally_events::{Paused, ProviderAdded, ProviderRemoved, Unpaused};
use tracing::info;

/// Owner and provider roles, the pause switch and per-actor action cooldowns.
#[derive(Clone, Debug)]
pub struct AccessControl {
    owner: Address,
    providers: HashSet<Address>,
    paused: bool,
    last_action: HashMap<Address, u64>,
}

impl AccessControl {
    /// The owner is fixed here for the life of the ledger and starts out as a provider.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            providers: HashSet::from([owner]),
            paused: false,
            last_action: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, actor: &Address) -> bool {
        self.owner == *actor
    }

    pub fn is_provider(&self, actor: &Address) -> bool {
        self.providers.contains(actor)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn last_action(&self, actor: &Address) -> Option<u64> {
        self.last_action.get(actor).copied()
    }

    pub fn ensure_owner(&self, actor: &Address) -> Result<(), LedgerError> {
        if !self.is_owner(actor) {
            return Err(LedgerError::NotOwner { actor: *actor });
        }
        Ok(())
    }

    pub fn ensure_provider(&self, actor: &Address) -> Result<(), LedgerError> {
        if !self.is_provider(actor) {
            return Err(LedgerError::NotProvider { actor: *actor });
        }
        Ok(())
    }

    pub fn ensure_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    /// Fails while `now` is inside `interval` seconds of the actor's last successful action.
    pub fn check_cooldown(
        &self,
        actor: &Address,
        now: u64,
        interval: u64,
    ) -> Result<(), LedgerError> {
        let Some(last) = self.last_action.get(actor) else {
            return Ok(());
        };
        let ready_at = last.saturating_add(interval);
        if now < ready_at {
            return Err(LedgerError::CooldownActive {
                remaining: ready_at - now,
            });
        }
        Ok(())
    }

    pub fn record_action(&mut self, actor: Address, now: u64) {
        self.last_action.insert(actor, now);
    }

    pub fn pause(&mut self, caller: &Address) -> Result<Paused, LedgerError> {
        self.ensure_owner(caller)?;
        self.ensure_not_paused()?;
        self.paused = true;
        info!(account = %caller, "Ledger paused");
        Ok(Paused { account: *caller })
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<Unpaused, LedgerError> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        info!(account = %caller, "Ledger unpaused");
        Ok(Unpaused { account: *caller })
    }

    pub fn add_provider(
        &mut self,
        caller: &Address,
        provider: Address,
    ) -> Result<ProviderAdded, LedgerError> {
        self.ensure_owner(caller)?;
        if !self.providers.insert(provider) {
            return Err(LedgerError::InvalidConfig(format!(
                "{provider} is already a provider"
            )));
        }
        Ok(ProviderAdded { provider })
    }

    pub fn remove_provider(
        &mut self,
        caller: &Address,
        provider: Address,
    ) -> Result<ProviderRemoved, LedgerError> {
        self.ensure_owner(caller)?;
        if !self.providers.remove(&provider) {
            return Err(LedgerError::InvalidConfig(format!(
                "{provider} is not a provider"
            )));
        }
        Ok(ProviderRemoved { provider })
    }
}
