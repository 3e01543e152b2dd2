//! Cross-crate tests for the murk workspace.
//!
//! [`interp`] evaluates the statement subset the passes emit, so tests can compare what a
//! program prints before and after obfuscation.
pub mod interp;

#[cfg(test)]
mod transforms;
#[cfg(test)]
mod tree;
