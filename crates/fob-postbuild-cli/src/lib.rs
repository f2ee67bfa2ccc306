//! Library half of the `fob-postbuild` binary.

pub mod cli;
pub mod error;
pub mod logger;
pub mod run;
