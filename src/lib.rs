#![forbid(unsafe_code)]

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod env;
pub mod error;
pub mod process;
pub mod setup;
pub mod ssh;
pub mod utils;
pub mod version;
