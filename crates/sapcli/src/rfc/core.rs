use std::collections::{BTreeMap, VecDeque};
use std::env;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::SapcliError;

/// Flat RFC structure: field name to character value.
pub type RfcStructure = BTreeMap<String, String>;

/// RFC table: a sequence of flat structures.
pub type RfcTable = Vec<RfcStructure>;

/// The three value shapes RFC parameter builders produce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RfcValue {
    Str(String),
    Structure(RfcStructure),
    Table(RfcTable),
}

impl From<&str> for RfcValue {
    fn from(value: &str) -> Self {
        RfcValue::Str(value.to_string())
    }
}

impl From<String> for RfcValue {
    fn from(value: String) -> Self {
        RfcValue::Str(value)
    }
}

impl From<RfcStructure> for RfcValue {
    fn from(value: RfcStructure) -> Self {
        RfcValue::Structure(value)
    }
}

impl From<RfcTable> for RfcValue {
    fn from(value: RfcTable) -> Self {
        RfcValue::Table(value)
    }
}

/// Named parameters of a remote function call.
pub type RfcParams = BTreeMap<String, RfcValue>;

/// Result values of a remote function call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfcResponse {
    #[serde(flatten)]
    values: BTreeMap<String, RfcValue>,
}

impl RfcResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<RfcValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&RfcValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &BTreeMap<String, RfcValue> {
        &self.values
    }
}

/// A single recorded remote function invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RfcCall {
    pub function: String,
    pub params: RfcParams,
}

/// Object-safe transport seam for remote function calls.
pub trait RfcConnection: Send + Sync {
    fn call(&self, function: &str, params: RfcParams) -> Result<RfcResponse, SapcliError>;
}

/// In-memory connection that records every call and replays queued
/// responses. Calls beyond the scripted queue receive an empty response,
/// which BAPI checking treats as success.
#[derive(Default)]
pub struct ScriptedConnection {
    responses: Mutex<VecDeque<RfcResponse>>,
    calls: Mutex<Vec<RfcCall>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: RfcResponse) {
        self.responses.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<RfcCall> {
        self.calls.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<RfcCall> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl RfcConnection for ScriptedConnection {
    fn call(&self, function: &str, params: RfcParams) -> Result<RfcResponse, SapcliError> {
        self.calls.lock().push(RfcCall {
            function: function.to_string(),
            params,
        });
        Ok(self.responses.lock().pop_front().unwrap_or_default())
    }
}

/// RFC destination parameters, matching the classic NW RFC logon set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    pub ashost: Option<String>,
    pub sysnr: Option<String>,
    pub client: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Fills unset fields from `SAPCLI_*` environment variables.
    pub fn or_env(self) -> Self {
        self.or_lookup(|name| env::var(name).ok())
    }

    /// Fills unset fields from the given lookup. Keys follow the
    /// environment naming (`SAPCLI_ASHOST` and friends).
    pub fn or_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.ashost = self.ashost.or_else(|| lookup("SAPCLI_ASHOST"));
        self.sysnr = self.sysnr.or_else(|| lookup("SAPCLI_SYSNR"));
        self.client = self.client.or_else(|| lookup("SAPCLI_CLIENT"));
        self.user = self.user.or_else(|| lookup("SAPCLI_USER"));
        self.password = self.password.or_else(|| lookup("SAPCLI_PASSWORD"));
        self
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.ashost.is_none() {
            missing.push("ashost");
        }
        if self.sysnr.is_none() {
            missing.push("sysnr");
        }
        if self.client.is_none() {
            missing.push("client");
        }
        if self.user.is_none() {
            missing.push("user");
        }
        if self.password.is_none() {
            missing.push("password");
        }
        missing
    }

    pub fn validate(&self) -> Result<(), SapcliError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }
        Err(SapcliError::Config(format!(
            "missing RFC destination parameters: {}",
            missing.join(", ")
        )))
    }

    /// Password-free summary for logging.
    pub fn describe(&self) -> String {
        format!(
            "ashost={} sysnr={} client={} user={}",
            self.ashost.as_deref().unwrap_or("?"),
            self.sysnr.as_deref().unwrap_or("?"),
            self.client.as_deref().unwrap_or("?"),
            self.user.as_deref().unwrap_or("?"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_connection_records_calls_in_order() {
        let conn = ScriptedConnection::new();

        let mut params = RfcParams::new();
        params.insert("USERNAME".into(), RfcValue::from("FOO"));
        conn.call("BAPI_USER_CREATE1", params.clone()).unwrap();
        conn.call("BAPI_USER_PROFILES_ASSIGN", RfcParams::new())
            .unwrap();

        let calls = conn.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].function, "BAPI_USER_CREATE1");
        assert_eq!(calls[0].params, params);
        assert_eq!(calls[1].function, "BAPI_USER_PROFILES_ASSIGN");
    }

    #[test]
    fn scripted_connection_replays_queued_responses() {
        let conn = ScriptedConnection::new();
        conn.push_response(RfcResponse::new().with_value("SYSTEM", "NPL"));

        let first = conn.call("RFC_PING", RfcParams::new()).unwrap();
        assert_eq!(first.get("SYSTEM"), Some(&RfcValue::from("NPL")));

        // Past the scripted queue, calls get an empty response.
        let second = conn.call("RFC_PING", RfcParams::new()).unwrap();
        assert_eq!(second, RfcResponse::new());
    }

    #[test]
    fn rfc_value_serializes_untagged() {
        let mut row = RfcStructure::new();
        row.insert("AGR_NAME".into(), "ADMIN".into());
        let table = RfcValue::Table(vec![row.clone()]);

        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"[{"AGR_NAME":"ADMIN"}]"#
        );
        assert_eq!(
            serde_json::to_string(&RfcValue::Structure(row)).unwrap(),
            r#"{"AGR_NAME":"ADMIN"}"#
        );
        assert_eq!(
            serde_json::to_string(&RfcValue::from("X")).unwrap(),
            r#""X""#
        );
    }

    #[test]
    fn config_lookup_fills_only_unset_fields() {
        let config = ConnectionConfig {
            ashost: Some("app.example.org".into()),
            ..ConnectionConfig::default()
        };

        let filled = config.or_lookup(|name| match name {
            "SAPCLI_ASHOST" => Some("ignored.example.org".into()),
            "SAPCLI_SYSNR" => Some("00".into()),
            "SAPCLI_CLIENT" => Some("100".into()),
            _ => None,
        });

        assert_eq!(filled.ashost.as_deref(), Some("app.example.org"));
        assert_eq!(filled.sysnr.as_deref(), Some("00"));
        assert_eq!(filled.client.as_deref(), Some("100"));
        assert_eq!(filled.user, None);
    }

    #[test]
    fn config_validate_names_missing_fields() {
        let config = ConnectionConfig {
            ashost: Some("app.example.org".into()),
            sysnr: Some("00".into()),
            ..ConnectionConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "config error: missing RFC destination parameters: client, user, password"
        );
    }

    #[test]
    fn config_describe_omits_password() {
        let config = ConnectionConfig {
            ashost: Some("app.example.org".into()),
            sysnr: Some("00".into()),
            client: Some("100".into()),
            user: Some("DEVELOPER".into()),
            password: Some("secret".into()),
        };

        let summary = config.describe();
        assert!(summary.contains("ashost=app.example.org"));
        assert!(!summary.contains("secret"));
    }
}
