//! Command-line front end shared by the `vertex-view` and `relax` binaries.
//!
//! - [`cli`]: argument parsing and the headless run modes.

pub mod cli;
