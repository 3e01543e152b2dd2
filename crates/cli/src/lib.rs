//! Command-line front end for the murk source obfuscator.
pub mod commands;
pub mod config;
pub mod input;
