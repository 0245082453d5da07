use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::commands;
use crate::context::{CliSession, Verbosity};
use crate::error::{CliError, ExitStatus};
use crate::formatter::{OutputFormat, emit_result};

const NAME: &str = "sapcli";

/// Process entry point: forwards the full argument vector to [`run_cli`]
/// and converts any error into its exit code. Errors are printed, never
/// swallowed, so the process status always reflects the delegate outcome.
pub fn run() -> ExitCode {
    init_tracing();
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses CLI arguments (argument zero included, per platform convention),
/// bootstraps the RFC session, and dispatches to the appropriate command.
/// Returns a POSIX `sysexits`-compatible `ExitCode` so automation can react
/// deterministically.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let session = CliSession::bootstrap(&matches, verbosity)?;
    if session.verbosity.verbose {
        tracing::info!(
            destination = %session.destination.describe(),
            dry_run = session.dry_run,
            "resolved RFC session"
        );
    }

    let result = dispatch(&session, &matches)?;
    emit_result(result, output)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Defines the root `clap::Command` tree: RFC destination flags, output
/// flags, and the `user` subcommand surface.
fn build_cli() -> Command {
    Command::new(NAME)
        .about("SAP user management over RFC")
        .arg(
            Arg::new("ashost")
                .long("ashost")
                .value_name("HOST")
                .help("Application server host of the RFC destination. Defaults to SAPCLI_ASHOST."),
        )
        .arg(
            Arg::new("sysnr")
                .long("sysnr")
                .value_name("SYSNR")
                .help("System number of the RFC destination. Defaults to SAPCLI_SYSNR."),
        )
        .arg(
            Arg::new("client")
                .long("client")
                .value_name("CLIENT")
                .help("Logon client. Defaults to SAPCLI_CLIENT."),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("USER")
                .help("Logon user. Defaults to SAPCLI_USER."),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .value_name("PASSWORD")
                .help("Logon password. Defaults to SAPCLI_PASSWORD."),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Emit newline-delimited JSON instead of human-readable text."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Emit additional logging about the RFC destination and session."),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Build the RFC calls and report them instead of contacting a destination."),
        )
        .subcommand_required(true)
        .subcommand(commands::user::command())
}

/// Delegates parsed subcommands to their respective modules. Unknown
/// subcommands map to `EX_USAGE` so callers receive actionable feedback.
fn dispatch(
    session: &CliSession,
    matches: &ArgMatches,
) -> Result<commands::CommandResult, CliError> {
    match matches.subcommand() {
        Some(("user", sub)) => commands::user::run(session, sub),
        _ => Err(CliError::new("missing command", ExitStatus::Usage)),
    }
}
