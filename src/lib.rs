//! Collector and command line front end for `calldrop-core`.

pub mod collector;
pub mod commands;
pub mod config;
pub mod report;
