/// Module for the `names` subcommand, which reports the identifiers a module declares and
/// the ones it only reads.
use crate::config::Config;
use crate::input::{load_module, CommandParser};
use async_trait::async_trait;
use clap::Args;
use murk_core::collector::{collect_names, CollectedNames};
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;

/// Arguments for the `names` subcommand.
#[derive(Args)]
pub struct NamesArgs {
    /// Input tree (.json) or source file (with --parser-cmd)
    pub input: PathBuf,
    /// Parser program reading source on stdin and writing a JSON tree on stdout
    #[arg(long)]
    parser_cmd: Option<String>,
}

#[async_trait]
impl super::Command for NamesArgs {
    async fn execute(self, _config: &Config) -> Result<(), Box<dyn Error>> {
        let parser = self.parser_cmd.as_deref().map(CommandParser::new).transpose()?;
        let module = load_module(&self.input, parser.as_ref())?;
        let report = names_report(&collect_names(&module));
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}

/// Renamable names are the ones an obfuscation run renames; external names and declared
/// names spelled out in opaque source stay as they are.
fn names_report(names: &CollectedNames) -> serde_json::Value {
    json!({
        "declared": names.declared,
        "renamable": names.renamable().collect::<Vec<_>>(),
        "referenced": names.referenced,
        "external": names.external().collect::<Vec<_>>(),
    })
}
