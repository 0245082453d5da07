use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SapcliError;
use crate::rfc::core::{RfcResponse, RfcStructure, RfcValue};

/// Message classes of BAPI `RETURN` rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BapiMessageType {
    Success,
    Error,
    Warning,
    Info,
    Abort,
}

impl BapiMessageType {
    pub fn code(self) -> &'static str {
        match self {
            BapiMessageType::Success => "S",
            BapiMessageType::Error => "E",
            BapiMessageType::Warning => "W",
            BapiMessageType::Info => "I",
            BapiMessageType::Abort => "A",
        }
    }
}

impl FromStr for BapiMessageType {
    type Err = SapcliError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            // Padding rows arrive with an empty TYPE and carry no error.
            "S" | "" => Ok(BapiMessageType::Success),
            "E" => Ok(BapiMessageType::Error),
            "W" => Ok(BapiMessageType::Warning),
            "I" => Ok(BapiMessageType::Info),
            "A" => Ok(BapiMessageType::Abort),
            other => Err(SapcliError::Rfc(format!(
                "unknown BAPI message type '{other}'"
            ))),
        }
    }
}

/// One row of a BAPI `RETURN` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BapiMessage {
    pub message_type: BapiMessageType,
    pub id: String,
    pub number: String,
    pub message: String,
    // Raw TYPE string of the row. Padding rows carry an empty one, and the
    // rendered error text must reproduce it verbatim.
    #[serde(skip)]
    type_code: String,
}

impl BapiMessage {
    pub fn from_row(row: &RfcStructure) -> Result<Self, SapcliError> {
        let field = |key: &str| row.get(key).cloned().unwrap_or_default();
        let type_code = field("TYPE");
        Ok(Self {
            message_type: type_code.parse()?,
            id: field("ID"),
            number: field("NUMBER"),
            message: field("MESSAGE"),
            type_code,
        })
    }

    /// The row's `TYPE` field as received, empty for padding rows.
    pub fn type_code(&self) -> &str {
        &self.type_code
    }

    pub fn is_error(&self) -> bool {
        self.message_type == BapiMessageType::Error
    }
}

/// A BAPI call whose `RETURN` table reported at least one error row.
#[derive(Clone, Debug)]
pub struct BapiError {
    messages: Vec<BapiMessage>,
    response: RfcResponse,
}

impl BapiError {
    pub fn new(messages: Vec<BapiMessage>, response: RfcResponse) -> Self {
        Self { messages, response }
    }

    /// All `RETURN` rows of the failed call, error rows included.
    pub fn messages(&self) -> &[BapiMessage] {
        &self.messages
    }

    pub fn errors(&self) -> impl Iterator<Item = &BapiMessage> {
        self.messages.iter().filter(|message| message.is_error())
    }

    pub fn response(&self) -> &RfcResponse {
        &self.response
    }
}

impl fmt::Display for BapiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .messages
            .iter()
            .map(|row| format!("{} {}", row.type_code, row.message))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl std::error::Error for BapiError {}

/// Checks the `RETURN` key of a BAPI response, accepting both the single
/// structure and the table form, and fails when any row is an error.
pub fn check_response(response: &RfcResponse) -> Result<(), SapcliError> {
    let rows: Vec<&RfcStructure> = match response.get("RETURN") {
        // An absent table is indistinguishable from an empty one in most
        // marshallings; neither carries an error row.
        None => return Ok(()),
        Some(RfcValue::Structure(row)) => vec![row],
        Some(RfcValue::Table(rows)) => rows.iter().collect(),
        Some(RfcValue::Str(_)) => {
            return Err(SapcliError::Rfc(
                "malformed RETURN value: expected structure or table".into(),
            ));
        }
    };

    let messages = rows
        .into_iter()
        .map(BapiMessage::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    if messages.iter().any(BapiMessage::is_error) {
        return Err(BapiError::new(messages, response.clone()).into());
    }

    Ok(())
}
