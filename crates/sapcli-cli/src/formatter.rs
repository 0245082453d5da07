use std::process::ExitCode;

use serde_json::json;

use crate::commands::{CallReport, CommandResult};
use crate::error::CliError;

pub enum OutputFormat {
    Text,
    Json,
}

/// Renders a `CommandResult` as either human-readable text or
/// newline-delimited JSON, converting the outcome into its exit code.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    match format {
        OutputFormat::Text => print_text(&result),
        OutputFormat::Json => print_json(&result)?,
    };
    Ok(ExitCode::from(result.exit_status().code()))
}

fn print_text(result: &CommandResult) {
    match result {
        CommandResult::UserCreated {
            username,
            dry_run,
            calls,
        } => {
            if *dry_run {
                println!("Dry run: would create user '{username}'");
            } else {
                println!("Created user '{username}'");
            }
            print_calls(calls);
        }
        CommandResult::RolesAssigned {
            username,
            roles,
            dry_run,
            calls,
        } => {
            if *dry_run {
                println!(
                    "Dry run: would assign {} role(s) to '{username}': {}",
                    roles.len(),
                    roles.join(", ")
                );
            } else {
                println!(
                    "Assigned {} role(s) to '{username}': {}",
                    roles.len(),
                    roles.join(", ")
                );
            }
            print_calls(calls);
        }
        CommandResult::ProfilesAssigned {
            username,
            profiles,
            dry_run,
            calls,
        } => {
            if *dry_run {
                println!(
                    "Dry run: would assign {} profile(s) to '{username}': {}",
                    profiles.len(),
                    profiles.join(", ")
                );
            } else {
                println!(
                    "Assigned {} profile(s) to '{username}': {}",
                    profiles.len(),
                    profiles.join(", ")
                );
            }
            print_calls(calls);
        }
    }
}

fn print_calls(calls: &[CallReport]) {
    for call in calls {
        println!("  {} {}", call.function, call.params);
    }
}

fn print_json(result: &CommandResult) -> Result<(), CliError> {
    let payload = json!(result);
    println!("{payload}");
    Ok(())
}
