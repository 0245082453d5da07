//! User management over RFC: parameter builders for the `BAPI_USER_*`
//! function modules and a manager proxy that performs the calls.

use chrono::{Local, NaiveDate};

use crate::error::SapcliError;
use crate::rfc::bapi::check_response;
use crate::rfc::core::{RfcConnection, RfcParams, RfcStructure, RfcTable, RfcValue};

const BAPI_USER_CREATE: &str = "BAPI_USER_CREATE1";
const BAPI_USER_ASSIGN_ROLES: &str = "BAPI_USER_ACTGROUPS_ASSIGN";
const BAPI_USER_ASSIGN_PROFILES: &str = "BAPI_USER_PROFILES_ASSIGN";

/// Open end of the logon validity window used when no end date is given.
const DEFAULT_VALID_TO: &str = "20991231";

/// Formats a date the way SAP character date fields expect it.
pub fn sap_date_from(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn today_sap_date() -> String {
    sap_date_from(Local::now().date_naive())
}

/// Builder for `BAPI_USER_CREATE1` parameters. Only the populated groups
/// appear in the result; the logon validity window defaults to today
/// through [`DEFAULT_VALID_TO`].
#[derive(Debug, Default)]
pub struct UserBuilder {
    username: Option<String>,
    address: RfcStructure,
    logondata: RfcStructure,
    password: RfcStructure,
    alias: RfcStructure,
}

impl UserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Sets the logon user name.
    pub fn set_username(&mut self, username: impl Into<String>) -> &mut Self {
        self.username = Some(username.into());
        self
    }

    pub fn set_first_name(&mut self, first_name: impl Into<String>) -> &mut Self {
        self.address.insert("FIRSTNAME".into(), first_name.into());
        self
    }

    pub fn set_last_name(&mut self, last_name: impl Into<String>) -> &mut Self {
        self.address.insert("LASTNAME".into(), last_name.into());
        self
    }

    pub fn set_email_address(&mut self, email_address: impl Into<String>) -> &mut Self {
        self.address.insert("E_MAIL".into(), email_address.into());
        self
    }

    /// Sets the password - honored only for the user type Service.
    pub fn set_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.password.insert("BAPIPWD".into(), password.into());
        self
    }

    /// Sets the alias used for HTTP authentication.
    pub fn set_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.alias.insert("USERALIAS".into(), alias.into());
        self
    }

    pub fn set_type(&mut self, typ: impl Into<String>) -> &mut Self {
        self.logondata.insert("USTYP".into(), typ.into());
        self
    }

    /// Sets the start of the logon validity window (`YYYYMMDD`).
    pub fn set_valid_from(&mut self, start_date: impl Into<String>) -> &mut Self {
        self.logondata.insert("GLTGV".into(), start_date.into());
        self
    }

    /// Sets the end of the logon validity window (`YYYYMMDD`).
    pub fn set_valid_to(&mut self, end_date: impl Into<String>) -> &mut Self {
        self.logondata.insert("GLTGB".into(), end_date.into());
        self
    }

    pub fn build_rfc_params(&self) -> RfcParams {
        let mut params = RfcParams::new();

        if let Some(username) = &self.username {
            params.insert("USERNAME".into(), RfcValue::from(username.clone()));
        }
        if !self.address.is_empty() {
            params.insert("ADDRESS".into(), RfcValue::Structure(self.address.clone()));
        }
        if !self.password.is_empty() {
            params.insert("PASSWORD".into(), RfcValue::Structure(self.password.clone()));
        }
        if !self.alias.is_empty() {
            params.insert("ALIAS".into(), RfcValue::Structure(self.alias.clone()));
        }

        let mut logondata = self.logondata.clone();
        logondata.entry("GLTGV".into()).or_insert_with(today_sap_date);
        logondata
            .entry("GLTGB".into())
            .or_insert_with(|| DEFAULT_VALID_TO.into());
        params.insert("LOGONDATA".into(), RfcValue::Structure(logondata));

        params
    }
}

/// Builder for `BAPI_USER_ACTGROUPS_ASSIGN` parameters.
#[derive(Debug)]
pub struct UserRoleAssignmentBuilder {
    username: String,
    roles: Vec<String>,
}

impl UserRoleAssignmentBuilder {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            roles: Vec::new(),
        }
    }

    pub fn add_roles<I, S>(&mut self, role_names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(role_names.into_iter().map(Into::into));
        self
    }

    /// Creates RFC parameters, or `None` when no roles were added.
    pub fn build_rfc_params(&self) -> Option<RfcParams> {
        if self.roles.is_empty() {
            return None;
        }

        let valid_from = today_sap_date();
        let rows: RfcTable = self
            .roles
            .iter()
            .map(|role_name| {
                RfcStructure::from([
                    ("AGR_NAME".to_string(), role_name.clone()),
                    ("FROM_DAT".to_string(), valid_from.clone()),
                    ("TO_DAT".to_string(), DEFAULT_VALID_TO.to_string()),
                ])
            })
            .collect();

        Some(RfcParams::from([
            ("USERNAME".to_string(), RfcValue::from(self.username.clone())),
            ("ACTIVITYGROUPS".to_string(), RfcValue::Table(rows)),
        ]))
    }
}

/// Builder for `BAPI_USER_PROFILES_ASSIGN` parameters.
#[derive(Debug)]
pub struct UserProfileAssignmentBuilder {
    username: String,
    profiles: Vec<String>,
}

impl UserProfileAssignmentBuilder {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            profiles: Vec::new(),
        }
    }

    pub fn add_profiles<I, S>(&mut self, profile_names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles
            .extend(profile_names.into_iter().map(Into::into));
        self
    }

    /// Creates RFC parameters, or `None` when no profiles were added.
    pub fn build_rfc_params(&self) -> Option<RfcParams> {
        if self.profiles.is_empty() {
            return None;
        }

        let rows: RfcTable = self
            .profiles
            .iter()
            .map(|profile_name| {
                RfcStructure::from([("BAPIPROF".to_string(), profile_name.clone())])
            })
            .collect();

        Some(RfcParams::from([
            ("USERNAME".to_string(), RfcValue::from(self.username.clone())),
            ("PROFILES".to_string(), RfcValue::Table(rows)),
        ]))
    }
}

/// Proxy to the SAP API managing users.
pub struct UserManager<'a> {
    conn: &'a dyn RfcConnection,
}

impl<'a> UserManager<'a> {
    pub fn new(conn: &'a dyn RfcConnection) -> Self {
        Self { conn }
    }

    /// Creates a new user from the given user data and returns its name.
    pub fn create_user(&self, builder: &UserBuilder) -> Result<String, SapcliError> {
        let username = builder
            .username()
            .ok_or_else(|| SapcliError::Input("user name is required".into()))?
            .to_string();

        let response = self.conn.call(BAPI_USER_CREATE, builder.build_rfc_params())?;
        check_response(&response)?;

        Ok(username)
    }

    /// Assigns roles. An empty builder performs no call.
    pub fn assign_roles(&self, builder: &UserRoleAssignmentBuilder) -> Result<(), SapcliError> {
        let Some(params) = builder.build_rfc_params() else {
            return Ok(());
        };

        let response = self.conn.call(BAPI_USER_ASSIGN_ROLES, params)?;
        check_response(&response)
    }

    /// Assigns profiles. An empty builder performs no call.
    pub fn assign_profiles(
        &self,
        builder: &UserProfileAssignmentBuilder,
    ) -> Result<(), SapcliError> {
        let Some(params) = builder.build_rfc_params() else {
            return Ok(());
        };

        let response = self.conn.call(BAPI_USER_ASSIGN_PROFILES, params)?;
        check_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::core::{RfcResponse, ScriptedConnection};

    fn logondata(valid_from: &str, valid_to: &str) -> RfcStructure {
        RfcStructure::from([
            ("GLTGV".to_string(), valid_from.to_string()),
            ("GLTGB".to_string(), valid_to.to_string()),
        ])
    }

    #[test]
    fn user_builder_defaults_validity_window() {
        let params = UserBuilder::new().build_rfc_params();

        let expected = RfcParams::from([(
            "LOGONDATA".to_string(),
            RfcValue::Structure(logondata(&today_sap_date(), DEFAULT_VALID_TO)),
        )]);
        assert_eq!(params, expected);
    }

    #[test]
    fn user_builder_emits_all_populated_groups() {
        let mut builder = UserBuilder::new();
        builder
            .set_username("FOO")
            .set_first_name("First")
            .set_last_name("Last")
            .set_email_address("email@example.org")
            .set_password("Password")
            .set_alias("HTTP_ALIAS")
            .set_type("S")
            .set_valid_from("20200101")
            .set_valid_to("20201231");

        let params = builder.build_rfc_params();

        let mut logondata = logondata("20200101", "20201231");
        logondata.insert("USTYP".into(), "S".into());
        let expected = RfcParams::from([
            ("USERNAME".to_string(), RfcValue::from("FOO")),
            (
                "ADDRESS".to_string(),
                RfcValue::Structure(RfcStructure::from([
                    ("FIRSTNAME".to_string(), "First".to_string()),
                    ("LASTNAME".to_string(), "Last".to_string()),
                    ("E_MAIL".to_string(), "email@example.org".to_string()),
                ])),
            ),
            (
                "PASSWORD".to_string(),
                RfcValue::Structure(RfcStructure::from([(
                    "BAPIPWD".to_string(),
                    "Password".to_string(),
                )])),
            ),
            (
                "ALIAS".to_string(),
                RfcValue::Structure(RfcStructure::from([(
                    "USERALIAS".to_string(),
                    "HTTP_ALIAS".to_string(),
                )])),
            ),
            ("LOGONDATA".to_string(), RfcValue::Structure(logondata)),
        ]);
        assert_eq!(params, expected);
    }

    #[test]
    fn role_builder_without_roles_yields_no_params() {
        let builder = UserRoleAssignmentBuilder::new("LOGON");
        assert_eq!(builder.build_rfc_params(), None);
    }

    #[test]
    fn role_builder_defaults_assignment_dates() {
        let mut builder = UserRoleAssignmentBuilder::new("LOGON");
        builder.add_roles(["1", "2", "3"]);

        let params = builder.build_rfc_params().unwrap();

        let today = today_sap_date();
        let rows: RfcTable = ["1", "2", "3"]
            .iter()
            .map(|name| {
                RfcStructure::from([
                    ("AGR_NAME".to_string(), name.to_string()),
                    ("FROM_DAT".to_string(), today.clone()),
                    ("TO_DAT".to_string(), DEFAULT_VALID_TO.to_string()),
                ])
            })
            .collect();
        let expected = RfcParams::from([
            ("USERNAME".to_string(), RfcValue::from("LOGON")),
            ("ACTIVITYGROUPS".to_string(), RfcValue::Table(rows)),
        ]);
        assert_eq!(params, expected);
    }

    #[test]
    fn profile_builder_without_profiles_yields_no_params() {
        let builder = UserProfileAssignmentBuilder::new("LOGON");
        assert_eq!(builder.build_rfc_params(), None);
    }

    #[test]
    fn profile_builder_emits_profile_rows() {
        let mut builder = UserProfileAssignmentBuilder::new("LOGON");
        builder.add_profiles(["SAP_ALL", "SAP_NEW"]);

        let params = builder.build_rfc_params().unwrap();

        let rows: RfcTable = vec![
            RfcStructure::from([("BAPIPROF".to_string(), "SAP_ALL".to_string())]),
            RfcStructure::from([("BAPIPROF".to_string(), "SAP_NEW".to_string())]),
        ];
        let expected = RfcParams::from([
            ("USERNAME".to_string(), RfcValue::from("LOGON")),
            ("PROFILES".to_string(), RfcValue::Table(rows)),
        ]);
        assert_eq!(params, expected);
    }

    #[test]
    fn create_user_calls_bapi_and_returns_username() {
        let conn = ScriptedConnection::new();
        let manager = UserManager::new(&conn);

        let mut builder = UserBuilder::new();
        builder.set_username("FOO").set_last_name("Last");

        let username = manager.create_user(&builder).unwrap();
        assert_eq!(username, "FOO");

        let calls = conn.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function, "BAPI_USER_CREATE1");
        assert_eq!(calls[0].params, builder.build_rfc_params());
    }

    #[test]
    fn create_user_without_username_is_an_input_error() {
        let conn = ScriptedConnection::new();
        let manager = UserManager::new(&conn);

        let err = manager.create_user(&UserBuilder::new()).unwrap_err();
        assert!(matches!(err, SapcliError::Input(_)));
        assert!(conn.calls().is_empty());
    }

    #[test]
    fn create_user_surfaces_bapi_errors() {
        let conn = ScriptedConnection::new();
        conn.push_response(RfcResponse::new().with_value(
            "RETURN",
            vec![RfcStructure::from([
                ("TYPE".to_string(), "E".to_string()),
                ("MESSAGE".to_string(), "User already exists".to_string()),
            ])],
        ));
        let manager = UserManager::new(&conn);

        let mut builder = UserBuilder::new();
        builder.set_username("FOO");

        let err = manager.create_user(&builder).unwrap_err();
        assert!(matches!(err, SapcliError::Bapi(_)));
        assert_eq!(err.to_string(), "E User already exists");
    }

    #[test]
    fn assign_roles_skips_call_for_empty_builder() {
        let conn = ScriptedConnection::new();
        let manager = UserManager::new(&conn);

        manager
            .assign_roles(&UserRoleAssignmentBuilder::new("LOGON"))
            .unwrap();
        assert!(conn.calls().is_empty());
    }

    #[test]
    fn assign_profiles_calls_bapi() {
        let conn = ScriptedConnection::new();
        let manager = UserManager::new(&conn);

        let mut builder = UserProfileAssignmentBuilder::new("LOGON");
        builder.add_profiles(["SAP_ALL"]);
        manager.assign_profiles(&builder).unwrap();

        let calls = conn.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function, "BAPI_USER_PROFILES_ASSIGN");
    }
}
