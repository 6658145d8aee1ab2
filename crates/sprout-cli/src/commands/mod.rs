//! Command implementations.
//!
//! Each command lives in its own module and exposes an `execute` function
//! taking its parsed arguments.

pub mod build;
pub mod routes;

pub use build::execute as build_execute;
pub use routes::execute as routes_execute;
