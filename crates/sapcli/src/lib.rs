pub mod error;
pub mod rfc;

pub use error::SapcliError;
pub use rfc::bapi::{BapiError, BapiMessage, BapiMessageType, check_response};
pub use rfc::core::{
    ConnectionConfig, RfcCall, RfcConnection, RfcParams, RfcResponse, RfcStructure, RfcTable,
    RfcValue, ScriptedConnection,
};
pub use rfc::user::{
    UserBuilder, UserManager, UserProfileAssignmentBuilder, UserRoleAssignmentBuilder,
    sap_date_from, today_sap_date,
};
