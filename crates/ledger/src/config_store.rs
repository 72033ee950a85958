// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LedgerError;
use tally_config::LedgerConfig;
use tally_events::{BatchId, CooldownUpdated, MaxBatchSizeUpdated, ModelVersionUpdated};
use tracing::info;

/// Tunable ledger parameters. Setters do not check ownership, the ledger does that before
/// calling them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigStore {
    cooldown_interval: u64,
    max_batch_size: u64,
    model_version: u64,
    max_pending_requests: Option<usize>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            cooldown_interval: 5,
            max_batch_size: 10,
            model_version: 1,
            max_pending_requests: None,
        }
    }
}

impl ConfigStore {
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        config
            .validate()
            .map_err(|e| LedgerError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            cooldown_interval: config.cooldown_interval_secs,
            max_batch_size: config.max_batch_size,
            model_version: config.model_version,
            max_pending_requests: config.max_pending_requests,
        })
    }

    pub fn cooldown_interval(&self) -> u64 {
        self.cooldown_interval
    }

    pub fn max_batch_size(&self) -> u64 {
        self.max_batch_size
    }

    pub fn model_version(&self) -> u64 {
        self.model_version
    }

    pub fn max_pending_requests(&self) -> Option<usize> {
        self.max_pending_requests
    }

    /// Id of the batch `open_batch` targets.
    pub fn current_batch_id(&self) -> BatchId {
        BatchId::new(self.model_version)
    }

    pub fn set_cooldown_interval(&mut self, value: u64) -> Result<CooldownUpdated, LedgerError> {
        if value == self.cooldown_interval {
            return Err(LedgerError::InvalidConfig(format!(
                "cooldown interval is already {value}s"
            )));
        }
        let old_value = std::mem::replace(&mut self.cooldown_interval, value);
        info!(old_value, new_value = value, "Cooldown interval updated");
        Ok(CooldownUpdated {
            old_value,
            new_value: value,
        })
    }

    pub fn set_max_batch_size(&mut self, value: u64) -> Result<MaxBatchSizeUpdated, LedgerError> {
        if value == 0 {
            return Err(LedgerError::InvalidConfig(
                "max batch size must be greater than zero".to_string(),
            ));
        }
        if value == self.max_batch_size {
            return Err(LedgerError::InvalidConfig(format!(
                "max batch size is already {value}"
            )));
        }
        let old_value = std::mem::replace(&mut self.max_batch_size, value);
        info!(old_value, new_value = value, "Max batch size updated");
        Ok(MaxBatchSizeUpdated {
            old_value,
            new_value: value,
        })
    }

    pub fn set_model_version(&mut self, value: u64) -> Result<ModelVersionUpdated, LedgerError> {
        if value == 0 {
            return Err(LedgerError::InvalidConfig(
                "model version must be greater than zero".to_string(),
            ));
        }
        if value == self.model_version {
            return Err(LedgerError::InvalidConfig(format!(
                "model version is already {value}"
            )));
        }
        let old_value = std::mem::replace(&mut self.model_version, value);
        info!(old_value, new_value = value, "Model version updated");
        Ok(ModelVersionUpdated {
            old_value,
            new_value: value,
        })
    }
}
