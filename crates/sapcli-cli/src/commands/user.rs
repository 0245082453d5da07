use chrono::NaiveDate;
use clap::{Arg, ArgMatches, Command};
use sapcli::{UserBuilder, UserManager, UserProfileAssignmentBuilder, UserRoleAssignmentBuilder};

use crate::commands::{CallReport, CommandResult};
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};

pub fn command() -> Command {
    Command::new("user")
        .about("Manage users over RFC")
        .subcommand_required(true)
        .subcommand(create_command())
        .subcommand(roles_command())
        .subcommand(profiles_command())
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    match matches.subcommand() {
        Some(("create", sub)) => create_user(session, sub),
        Some(("roles", sub)) => assign_roles(session, sub),
        Some(("profiles", sub)) => assign_profiles(session, sub),
        _ => Err(CliError::new("unsupported user command", ExitStatus::Usage)),
    }
}

fn create_command() -> Command {
    Command::new("create")
        .about("Create a user via BAPI_USER_CREATE1")
        .arg(
            Arg::new("username")
                .long("username")
                .value_name("NAME")
                .help("Logon name of the new user"),
        )
        .arg(
            Arg::new("first-name")
                .long("first-name")
                .value_name("NAME")
                .help("First name"),
        )
        .arg(
            Arg::new("last-name")
                .long("last-name")
                .value_name("NAME")
                .help("Last name"),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .value_name("ADDRESS")
                .help("Email address"),
        )
        .arg(
            Arg::new("new-password")
                .long("new-password")
                .value_name("PASSWORD")
                .help("Initial password. Honored only for the user type Service."),
        )
        .arg(
            Arg::new("alias")
                .long("alias")
                .value_name("ALIAS")
                .help("Alias for HTTP authentication"),
        )
        .arg(
            Arg::new("type")
                .long("type")
                .value_name("USTYP")
                .help("User type code (e.g. A dialog, S service)"),
        )
        .arg(
            Arg::new("valid-from")
                .long("valid-from")
                .value_name("YYYYMMDD")
                .help("Start of the logon validity window. Defaults to today."),
        )
        .arg(
            Arg::new("valid-to")
                .long("valid-to")
                .value_name("YYYYMMDD")
                .help("End of the logon validity window. Defaults to 20991231."),
        )
}

fn roles_command() -> Command {
    Command::new("roles")
        .about("Assign roles via BAPI_USER_ACTGROUPS_ASSIGN")
        .arg(
            Arg::new("username")
                .long("username")
                .value_name("NAME")
                .help("Logon name of the user"),
        )
        .arg(
            Arg::new("roles")
                .value_name("ROLE")
                .num_args(1..)
                .required(true)
                .help("Role names to assign, in order"),
        )
}

fn profiles_command() -> Command {
    Command::new("profiles")
        .about("Assign profiles via BAPI_USER_PROFILES_ASSIGN")
        .arg(
            Arg::new("username")
                .long("username")
                .value_name("NAME")
                .help("Logon name of the user"),
        )
        .arg(
            Arg::new("profiles")
                .value_name("PROFILE")
                .num_args(1..)
                .required(true)
                .help("Profile names to assign, in order"),
        )
}

fn create_user(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let username = required(matches, "username")?;

    let mut builder = UserBuilder::new();
    builder.set_username(&username);
    if let Some(first_name) = matches.get_one::<String>("first-name") {
        builder.set_first_name(first_name);
    }
    if let Some(last_name) = matches.get_one::<String>("last-name") {
        builder.set_last_name(last_name);
    }
    if let Some(email) = matches.get_one::<String>("email") {
        builder.set_email_address(email);
    }
    if let Some(password) = matches.get_one::<String>("new-password") {
        builder.set_password(password);
    }
    if let Some(alias) = matches.get_one::<String>("alias") {
        builder.set_alias(alias);
    }
    if let Some(typ) = matches.get_one::<String>("type") {
        builder.set_type(typ);
    }
    if let Some(valid_from) = matches.get_one::<String>("valid-from") {
        builder.set_valid_from(validate_sap_date(valid_from, "--valid-from")?);
    }
    if let Some(valid_to) = matches.get_one::<String>("valid-to") {
        builder.set_valid_to(validate_sap_date(valid_to, "--valid-to")?);
    }

    let manager = UserManager::new(session.connection());
    let username = manager.create_user(&builder)?;

    Ok(CommandResult::UserCreated {
        username,
        dry_run: session.dry_run,
        calls: CallReport::from_calls(session.recorded_calls())?,
    })
}

fn assign_roles(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let username = required(matches, "username")?;
    let roles: Vec<String> = matches
        .get_many::<String>("roles")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let mut builder = UserRoleAssignmentBuilder::new(&username);
    builder.add_roles(roles.iter().cloned());

    let manager = UserManager::new(session.connection());
    manager.assign_roles(&builder)?;

    Ok(CommandResult::RolesAssigned {
        username,
        roles,
        dry_run: session.dry_run,
        calls: CallReport::from_calls(session.recorded_calls())?,
    })
}

fn assign_profiles(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let username = required(matches, "username")?;
    let profiles: Vec<String> = matches
        .get_many::<String>("profiles")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let mut builder = UserProfileAssignmentBuilder::new(&username);
    builder.add_profiles(profiles.iter().cloned());

    let manager = UserManager::new(session.connection());
    manager.assign_profiles(&builder)?;

    Ok(CommandResult::ProfilesAssigned {
        username,
        profiles,
        dry_run: session.dry_run,
        calls: CallReport::from_calls(session.recorded_calls())?,
    })
}

fn required(matches: &ArgMatches, name: &str) -> Result<String, CliError> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| CliError::new(format!("--{name} is required"), ExitStatus::Usage))
}

fn validate_sap_date(value: &str, flag: &str) -> Result<String, CliError> {
    NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| {
        CliError::new(
            format!("{flag} '{value}' is not a valid YYYYMMDD date"),
            ExitStatus::Usage,
        )
    })?;
    Ok(value.to_string())
}
