// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_simple_tracing;
use crate::{config_print, simulate};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand, ValueEnum};
use tally_config::{load_config, FheBackendKind, LedgerConfig};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "A CLI for the Tally confidential aggregation ledger", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `tally -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    pub async fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());
        let config = self.load_config()?;
        info!(owner = %config.owner, identity = %config.identity, "Config loaded");

        match self.command {
            Commands::Config => config_print::execute(&config)?,
            Commands::Simulate { values, backend } => {
                simulate::execute(config, values, backend.map(Into::into)).await?
            }
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<LedgerConfig> {
        load_config(self.config.clone())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Plaintext,
    Bfv,
}

impl From<BackendArg> for FheBackendKind {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Plaintext => FheBackendKind::Plaintext,
            BackendArg::Bfv => FheBackendKind::Bfv,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved configuration
    Config,

    /// Run a batch end to end against an in-process ledger and oracle
    Simulate {
        /// Value submitted by a fresh participant. Repeat for more participants.
        #[arg(long = "value", value_name = "VALUE", action = ArgAction::Append)]
        values: Vec<u64>,

        /// Ciphertext backend. Defaults to the configured one.
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,
    },
}
