use crate::config::Config;
use async_trait::async_trait;
use clap::Subcommand;
use std::error::Error;

pub mod names;
pub mod obfuscate;
pub mod render;

#[derive(Subcommand)]
pub enum Cmd {
    /// Obfuscate a module and print (or write) the result
    Obfuscate(obfuscate::ObfuscateArgs),

    /// List the identifiers a module declares and references
    Names(names::NamesArgs),

    /// Print a tree as source text
    Render(render::RenderArgs),
}

#[async_trait]
pub trait Command {
    async fn execute(self, config: &Config) -> Result<(), Box<dyn Error>>;
}

#[async_trait]
impl Command for Cmd {
    async fn execute(self, config: &Config) -> Result<(), Box<dyn Error>> {
        match self {
            Cmd::Obfuscate(args) => args.execute(config).await,
            Cmd::Names(args) => args.execute(config).await,
            Cmd::Render(args) => args.execute(config).await,
        }
    }
}
