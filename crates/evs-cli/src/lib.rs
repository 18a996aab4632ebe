//! Library side of the `evs` command-line tool.

#![allow(missing_docs)]

pub mod commands;
pub mod logging;
pub mod summary;
