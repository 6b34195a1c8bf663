//! Library service
//!
//! Book catalogue modules plus the process lifecycle that opens the database,
//! applies migrations, and serves the module routes.

pub mod app;
pub mod modules;
pub mod schema;

pub use modules::books;
