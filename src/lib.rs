pub mod args;
#[macro_use]
pub mod core;
pub mod config;
pub mod errors;
pub mod readwrite;
pub mod runner;
pub mod stats;
pub mod sweep;
