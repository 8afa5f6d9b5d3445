//! Logging setup shared by crew-studio binaries.
//!
//! Output goes to stderr so command output on stdout stays pipeable.

pub mod logging;
