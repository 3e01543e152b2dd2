/// Module for the `render` subcommand, which prints a tree as source text.
use crate::config::Config;
use crate::input::{load_module, CommandParser};
use async_trait::async_trait;
use clap::Args;
use murk_core::printer::{Printer, SourcePrinter};
use std::error::Error;
use std::path::PathBuf;

/// Arguments for the `render` subcommand.
#[derive(Args)]
pub struct RenderArgs {
    /// Input tree (.json) or source file (with --parser-cmd)
    pub input: PathBuf,
    /// Parser program reading source on stdin and writing a JSON tree on stdout
    #[arg(long)]
    parser_cmd: Option<String>,
    /// Spaces per indentation level
    #[arg(long, default_value_t = 4)]
    indent: usize,
}

#[async_trait]
impl super::Command for RenderArgs {
    async fn execute(self, _config: &Config) -> Result<(), Box<dyn Error>> {
        let parser = self.parser_cmd.as_deref().map(CommandParser::new).transpose()?;
        let module = load_module(&self.input, parser.as_ref())?;
        let printer = SourcePrinter::with_indent(" ".repeat(self.indent));
        print!("{}", printer.unparse(&module));
        Ok(())
    }
}
