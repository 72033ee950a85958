// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use tally_config::{LedgerConfig, DEV_IDENTITY, DEV_OWNER};
use tracing_subscriber::{fmt, EnvFilter};

pub fn owner() -> Address {
    DEV_OWNER
}

pub fn identity() -> Address {
    DEV_IDENTITY
}

/// Deterministic, distinct non-owner address per index.
pub fn actor(n: u8) -> Address {
    Address::repeat_byte(n)
}

/// Default config with the given extra providers.
pub fn config_with_providers(providers: &[Address]) -> LedgerConfig {
    LedgerConfig {
        providers: providers.to_vec(),
        ..LedgerConfig::default()
    }
}

/// Route test logs through the test writer. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
