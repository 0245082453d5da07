use sapcli::RfcCall;
use serde::Serialize;

use crate::error::{CliError, ExitStatus};

pub mod user;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    UserCreated {
        username: String,
        dry_run: bool,
        calls: Vec<CallReport>,
    },
    RolesAssigned {
        username: String,
        roles: Vec<String>,
        dry_run: bool,
        calls: Vec<CallReport>,
    },
    ProfilesAssigned {
        username: String,
        profiles: Vec<String>,
        dry_run: bool,
        calls: Vec<CallReport>,
    },
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CommandResult::UserCreated { .. }
            | CommandResult::RolesAssigned { .. }
            | CommandResult::ProfilesAssigned { .. } => ExitStatus::Ok,
        }
    }
}

/// A performed (or previewed) RFC invocation with its parameters.
#[derive(Debug, Serialize)]
pub struct CallReport {
    pub function: String,
    pub params: serde_json::Value,
}

impl CallReport {
    pub fn from_calls(calls: Vec<RfcCall>) -> Result<Vec<CallReport>, CliError> {
        calls
            .into_iter()
            .map(|call| {
                let params = serde_json::to_value(&call.params)
                    .map_err(|err| CliError::new(err.to_string(), ExitStatus::Software))?;
                Ok(CallReport {
                    function: call.function,
                    params,
                })
            })
            .collect()
    }
}
