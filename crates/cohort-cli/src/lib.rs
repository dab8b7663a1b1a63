#![deny(unsafe_code)]

//! Library surface of the `cohort` CLI: logging setup, command execution,
//! and the run summary, kept importable for integration tests.

pub mod commands;
pub mod logging;
pub mod summary;
