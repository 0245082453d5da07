use std::sync::Arc;

use clap::ArgMatches;
use sapcli::{ConnectionConfig, RfcConnection, ScriptedConnection};

use crate::error::{CliError, ExitStatus};

#[derive(Clone, Copy, Debug, Default)]
pub struct Verbosity {
    pub json: bool,
    pub verbose: bool,
}

/// Per-invocation state shared across commands: the resolved RFC
/// destination and the connection the commands call through.
pub struct CliSession {
    pub destination: ConnectionConfig,
    pub dry_run: bool,
    pub verbosity: Verbosity,
    connection: Arc<ScriptedConnection>,
}

impl CliSession {
    /// Resolves the RFC destination from flags with `SAPCLI_*` environment
    /// fallbacks. Only dry-run sessions can proceed in this build: the NW
    /// RFC transport is an optional system binding that is not bundled, so
    /// a live destination fails with a configuration error the same way
    /// the tool does when its RFC binding is absent.
    pub fn bootstrap(matches: &ArgMatches, verbosity: Verbosity) -> Result<Self, CliError> {
        let destination = ConnectionConfig {
            ashost: matches.get_one::<String>("ashost").cloned(),
            sysnr: matches.get_one::<String>("sysnr").cloned(),
            client: matches.get_one::<String>("client").cloned(),
            user: matches.get_one::<String>("user").cloned(),
            password: matches.get_one::<String>("password").cloned(),
        }
        .or_env();

        let dry_run = matches.get_flag("dry-run");
        if !dry_run {
            destination.validate()?;
            return Err(CliError::new(
                "RFC connectivity is not available; re-run with --dry-run to preview the calls",
                ExitStatus::Config,
            ));
        }

        Ok(Self {
            destination,
            dry_run,
            verbosity,
            connection: Arc::new(ScriptedConnection::new()),
        })
    }

    pub fn connection(&self) -> &dyn RfcConnection {
        self.connection.as_ref()
    }

    /// Drains the calls recorded so far, for reporting.
    pub fn recorded_calls(&self) -> Vec<sapcli::RfcCall> {
        self.connection.take_calls()
    }
}
