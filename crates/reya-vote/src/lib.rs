// Library root: re-exports all modules so integration tests and the binary
// share one public API.

pub mod accounts;
pub mod api;
pub mod config;
pub mod error;
pub mod runner;
pub mod signing;
pub mod worker;
