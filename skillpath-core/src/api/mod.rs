//! Transport-facing pieces shared by the server and its clients.

pub mod routes;
pub mod types;
