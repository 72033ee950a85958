// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path};
use alloy_primitives::{address, Address};
use anyhow::{anyhow, bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG_NAME: &str = "tally.config.yaml";
pub const ENV_PREFIX: &str = "TALLY_";

/// First development account. Owns the ledger unless configured otherwise.
pub const DEV_OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
/// Identity of a ledger deployment, mixed into every decryption fingerprint.
pub const DEV_IDENTITY: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FheBackendKind {
    /// Passthrough values, no encryption
    #[default]
    Plaintext,
    /// BFV over fhe.rs
    Bfv,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct OracleConfig {
    /// Address whose signatures are accepted as decryption proofs. When absent the local oracle
    /// generates a key and its address is used.
    pub address: Option<Address>,
    pub fhe: FheBackendKind,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LedgerConfig {
    pub owner: Address,
    pub identity: Address,
    /// Providers appointed at startup in addition to the owner
    pub providers: Vec<Address>,
    pub cooldown_interval_secs: u64,
    pub max_batch_size: u64,
    pub model_version: u64,
    /// Bound on unprocessed decryption requests. Unbounded when absent.
    pub max_pending_requests: Option<usize>,
    pub oracle: OracleConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            owner: DEV_OWNER,
            identity: DEV_IDENTITY,
            providers: vec![],
            cooldown_interval_secs: 5,
            max_batch_size: 10,
            model_version: 1,
            max_pending_requests: None,
            oracle: OracleConfig::default(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            bail!("max_batch_size must be greater than zero");
        }
        if self.model_version == 0 {
            bail!("model_version must be greater than zero");
        }
        if self.max_pending_requests == Some(0) {
            bail!("max_pending_requests must be greater than zero when set");
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Could not serialize configuration")
    }
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| anyhow!("No config dir available on this OS"))?
            .join("tally"))
    }
}

/// Resolve and load the ledger configuration.
///
/// Layers, later wins: built-in defaults, the YAML config file, `TALLY_` environment variables
/// (nested keys split on `__`, eg. `TALLY_ORACLE__FHE=bfv`). An explicitly passed file must exist.
pub fn load_config(cli_file: Option<String>) -> Result<LedgerConfig> {
    let cli_file = cli_file.map(PathBuf::from);
    let resolved = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        cli_file.clone(),
    );

    let mut figment = Figment::from(Serialized::defaults(LedgerConfig::default()));
    if resolved.exists() {
        info!(path = %resolved.display(), "Loading configuration");
        figment = figment.merge(Yaml::file(&resolved));
    } else if cli_file.is_some() {
        bail!("Configuration file not found: {}", resolved.display());
    }

    let config: LedgerConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Could not parse configuration")?;

    config.validate()?;
    Ok(config)
}
