//! RFC building blocks: the parameter value model, connection abstractions,
//! BAPI return-table handling, and user management on top of them.

pub mod bapi;
pub mod core;
pub mod user;
