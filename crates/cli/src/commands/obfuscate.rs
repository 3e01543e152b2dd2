/// Module for the `obfuscate` subcommand, which runs the obfuscation pipeline over one
/// module.
///
/// This module loads the input tree, wires the name and fragment oracles (or their offline
/// stand-ins), builds the requested passes and writes the obfuscated source. It also emits
/// a JSON report with the mapping, per-pass results and metrics if requested.
use crate::config::{Config, API_KEY_VAR};
use crate::input::{load_module, CommandParser};
use async_trait::async_trait;
use clap::Args;
use murk_core::parser::Parser;
use murk_core::printer::{Printer, SourcePrinter};
use murk_oracle::{
    AesGcmCipher, FragmentOracle, IdentifierOracle, LlmClient, LlmFragmentOracle, LlmNameOracle,
    NameGenerator, RandomNameOracle, UnavailableOracle,
};
use murk_transform::{
    control_flow::ControlFlowFlattener,
    encrypt::FunctionBodyEncryptor,
    junk::JunkCodeInserter,
    obfuscator::{ObfuscationConfig, ObfuscationResult, Obfuscator},
    string_encoder::StringLiteralEncoder,
    PassConfig, Transform,
};
use murk_utils::errors::ObfuscateError;
use serde_json::json;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Arguments for the `obfuscate` subcommand.
#[derive(Args)]
pub struct ObfuscateArgs {
    /// Input tree (.json) or source file (with --parser-cmd)
    pub input: PathBuf,
    /// Write the obfuscated source here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Comma-separated list of passes (default: strings,junk,control_flow,encrypt).
    #[arg(long, default_value = "strings,junk,control_flow,encrypt")]
    passes: String,
    /// Number of junk functions to insert when the junk pass is selected
    #[arg(long, default_value_t = 1)]
    junk_count: usize,
    /// Keep the junk functions' own names instead of drawing fresh ones
    #[arg(long)]
    keep_junk_names: bool,
    /// Seed for offline name generation; without it offline names are var_0, var_1, ...
    #[arg(long)]
    seed: Option<u64>,
    /// Parser program reading source on stdin and writing a JSON tree on stdout
    #[arg(long)]
    parser_cmd: Option<String>,
    /// Never contact the LLM oracles
    #[arg(long)]
    offline: bool,
    /// Path to emit the obfuscation report as JSON (optional).
    #[arg(long)]
    emit: Option<PathBuf>,
}

/// Executes the `obfuscate` subcommand.
#[async_trait]
impl super::Command for ObfuscateArgs {
    async fn execute(self, config: &Config) -> Result<(), Box<dyn Error>> {
        let parser = self.parser_cmd.as_deref().map(CommandParser::new).transpose()?;
        let module = load_module(&self.input, parser.as_ref())?;

        let client = if self.offline {
            None
        } else if config.has_api_key() {
            Some(LlmClient::new(config.llm.clone())?)
        } else {
            warn!("{API_KEY_VAR} is not set, running offline");
            None
        };

        let fragments = match (&client, parser) {
            (Some(client), Some(parser)) => {
                let oracle: Arc<dyn FragmentOracle> =
                    Arc::new(LlmFragmentOracle::new(client.clone()));
                let parser: Arc<dyn Parser> = Arc::new(parser);
                Some((oracle, parser))
            }
            _ => None,
        };

        let transforms =
            build_passes(&self.passes, self.junk_count, self.keep_junk_names, fragments)?;
        info!("Applying {} passes", transforms.len());

        let obfuscator = Obfuscator::new(name_generator(client.as_ref(), self.seed, config));
        let result = obfuscator
            .obfuscate(
                module,
                ObfuscationConfig {
                    transforms,
                    pass_config: PassConfig {
                        reserve_slack: config.reserve_slack,
                    },
                },
            )
            .await?;

        let source = SourcePrinter::default().unparse(&result.module);
        match &self.output {
            Some(path) => {
                fs::write(path, &source)?;
                info!("Wrote obfuscated source to {}", path.display());
            }
            None => print!("{source}"),
        }

        if let Some(path) = &self.emit {
            fs::write(path, serde_json::to_string_pretty(&report(&result))?)?;
            info!("Wrote obfuscation report to {}", path.display());
        }

        info!(
            "Obfuscation complete: {} names mapped, potency {:.1} → {:.1}",
            result.mapping.len(),
            result.before.potency,
            result.after.potency
        );
        Ok(())
    }
}

/// Picks the identifier oracle: the LLM when reachable, else seeded random names, else none
/// (every name then comes from the `var_N` fallback).
fn name_generator(client: Option<&LlmClient>, seed: Option<u64>, config: &Config) -> NameGenerator {
    let oracle: Arc<dyn IdentifierOracle> = match (client, seed) {
        (Some(client), _) => Arc::new(LlmNameOracle::new(client.clone())),
        (None, Some(seed)) => Arc::new(RandomNameOracle::new(seed)),
        (None, None) => Arc::new(UnavailableOracle),
    };
    NameGenerator::new(oracle)
        .with_hint(config.name_hint.clone())
        .with_timeout(Duration::from_millis(config.name_timeout_ms))
}

/// Builds a list of transform passes from a comma-separated string.
fn build_passes(
    passes: &str,
    junk_count: usize,
    keep_junk_names: bool,
    fragments: Option<(Arc<dyn FragmentOracle>, Arc<dyn Parser>)>,
) -> Result<Vec<Box<dyn Transform>>, ObfuscateError> {
    let mut out: Vec<Box<dyn Transform>> = Vec::new();
    for name in passes.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name {
            "strings" => out.push(Box::new(StringLiteralEncoder)),
            "junk" => {
                let mut junk = JunkCodeInserter::new().with_rename(!keep_junk_names);
                if let Some((oracle, parser)) = &fragments {
                    junk = junk.with_oracle(oracle.clone(), parser.clone());
                }
                for _ in 0..junk_count {
                    out.push(Box::new(junk.clone()));
                }
            }
            "control_flow" => out.push(Box::new(ControlFlowFlattener)),
            "encrypt" => out.push(Box::new(FunctionBodyEncryptor::new(
                Arc::new(AesGcmCipher),
                Arc::new(SourcePrinter::default()),
            ))),
            _ => return Err(ObfuscateError::InvalidPass(name.to_string())),
        }
    }
    Ok(out)
}

/// Generates the JSON report written by `--emit`.
fn report(result: &ObfuscationResult) -> serde_json::Value {
    json!({
        "mapping": result.mapping,
        "transforms_applied": result.metadata.transforms_applied,
        "passes": result.metadata.passes,
        "names_collected": result.metadata.names_collected,
        "names_reserved": result.metadata.names_reserved,
        "synthetic_names": result.metadata.synthetic_names,
        "helpers_inserted": result.metadata.helpers_inserted,
        "before": result.before,
        "after": result.after,
        "potency_delta": result.after.potency - result.before.potency,
        "original_digest": result.original_digest,
        "obfuscated_digest": result.obfuscated_digest,
    })
}
