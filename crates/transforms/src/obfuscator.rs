use crate::mapping::build_mapping;
use crate::pass::{self, PassReport};
use crate::rename::Renamer;
use crate::{HelperKind, PassConfig, PassContext, Transform};
use indexmap::IndexMap;
use murk_analysis::{collect_metrics, digest, Metrics};
use murk_core::ast::{Module, Stmt};
use murk_core::collect_names;
use murk_oracle::names::NameGenerator;
use murk_utils::errors::ObfuscateError;
use serde::{Deserialize, Serialize};

/// Configuration for the obfuscation pipeline
pub struct ObfuscationConfig {
    /// Passes to apply, in order, after the baseline renaming
    pub transforms: Vec<Box<dyn Transform>>,
    /// Pass configuration for transform behavior
    pub pass_config: PassConfig,
}

impl Default for ObfuscationConfig {
    fn default() -> Self {
        Self {
            transforms: Vec::new(),
            pass_config: PassConfig::default(),
        }
    }
}

impl std::fmt::Debug for ObfuscationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObfuscationConfig")
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("pass_config", &self.pass_config)
            .finish()
    }
}

/// Result of the obfuscation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationResult {
    /// The transformed tree, helpers included
    pub module: Module,
    /// Original → replacement identifiers used for this run
    pub mapping: IndexMap<String, String>,
    /// Structural metrics of the input tree
    pub before: Metrics,
    /// Structural metrics of the output tree
    pub after: Metrics,
    /// Keccak-256 of the printed input
    pub original_digest: String,
    /// Keccak-256 of the printed output
    pub obfuscated_digest: String,
    /// Metadata about the obfuscation process
    pub metadata: ObfuscationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationMetadata {
    /// Names of transforms that were applied, baseline renaming first
    pub transforms_applied: Vec<String>,
    /// Per-pass outcome in execution order
    pub passes: Vec<PassReport>,
    /// Number of declared identifiers found in the input
    pub names_collected: usize,
    /// Size of the reserved pool requested up front
    pub names_reserved: usize,
    /// Reserved names handed to passes, in order
    pub synthetic_names: Vec<String>,
    /// Helper definitions inserted at the top of the module
    pub helpers_inserted: Vec<HelperKind>,
}

/// Main obfuscation pipeline.
///
/// One [`Obfuscator`] can serve any number of runs, concurrently included: every run owns
/// its own tree, mapping and [`PassContext`].
#[derive(Debug)]
pub struct Obfuscator {
    names: NameGenerator,
}

impl Obfuscator {
    pub const fn new(names: NameGenerator) -> Self {
        Self { names }
    }

    pub async fn obfuscate(
        &self,
        mut module: Module,
        config: ObfuscationConfig,
    ) -> Result<ObfuscationResult, ObfuscateError> {
        tracing::debug!("Starting obfuscation pipeline:");
        tracing::debug!("  Top-level statements: {}", module.body.len());
        tracing::debug!("  User transforms: {}", config.transforms.len());

        // Step 1: Collect identifiers and size the reserved pool
        let collected = collect_names(&module);
        let reserve = config
            .transforms
            .iter()
            .map(|t| t.reserved_names(&module))
            .sum::<usize>()
            + config.pass_config.reserve_slack;
        tracing::debug!(
            "  Declared names: {}, referenced names: {}, reserve: {}",
            collected.declared.len(),
            collected.referenced.len(),
            reserve
        );

        // Step 2: One batched naming request for the whole run
        let mapping = build_mapping(&collected, reserve, &self.names).await;
        let mut ctx = PassContext::new(mapping);

        let before = collect_metrics(&module);
        let original_digest = digest(&module);

        // Step 3: Baseline renaming, then the user passes
        let mut all_transforms: Vec<Box<dyn Transform>> = vec![Box::new(Renamer)];
        all_transforms.extend(config.transforms);
        let transforms_applied: Vec<String> =
            all_transforms.iter().map(|t| t.name().to_string()).collect();

        let passes = pass::run(&mut module, &all_transforms, &mut ctx).await?;

        // Step 4: Helpers, each kind once, in first-registration order
        let mut helpers: IndexMap<HelperKind, Stmt> = IndexMap::new();
        for transform in &all_transforms {
            for aux in transform.auxiliary_definitions(&ctx) {
                helpers.entry(aux.kind).or_insert(aux.definition);
            }
        }
        let helpers_inserted: Vec<HelperKind> = helpers.keys().copied().collect();
        tracing::debug!("  Helpers inserted: {:?}", helpers_inserted);
        module.body.splice(0..0, helpers.into_values());

        let after = collect_metrics(&module);
        let obfuscated_digest = digest(&module);

        let mapping: IndexMap<String, String> = ctx
            .mapping()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(ObfuscationResult {
            module,
            metadata: ObfuscationMetadata {
                transforms_applied,
                passes,
                names_collected: collected.declared.len(),
                names_reserved: reserve,
                synthetic_names: ctx.synthetic_names().to_vec(),
                helpers_inserted,
            },
            mapping,
            before,
            after,
            original_digest,
            obfuscated_digest,
        })
    }
}

/// Convenience function to create common transform configurations
pub mod presets {
    use super::*;
    use crate::{
        control_flow::ControlFlowFlattener, encrypt::FunctionBodyEncryptor,
        junk::JunkCodeInserter, string_encoder::StringLiteralEncoder,
    };
    use murk_core::{Parser, Printer};
    use murk_oracle::{Cipher, FragmentOracle};
    use std::sync::Arc;

    /// String encoding on top of renaming
    pub fn default_obfuscation() -> ObfuscationConfig {
        ObfuscationConfig {
            transforms: vec![Box::new(StringLiteralEncoder)],
            pass_config: PassConfig::default(),
        }
    }

    /// Every pass: strings, junk, control flow, then encryption
    pub fn full_obfuscation(
        fragments: Option<(Arc<dyn FragmentOracle>, Arc<dyn Parser>)>,
        cipher: Arc<dyn Cipher>,
        printer: Arc<dyn Printer>,
    ) -> ObfuscationConfig {
        let junk = match fragments {
            Some((oracle, parser)) => JunkCodeInserter::new().with_oracle(oracle, parser),
            None => JunkCodeInserter::new(),
        };
        ObfuscationConfig {
            transforms: vec![
                Box::new(StringLiteralEncoder),
                Box::new(junk),
                Box::new(ControlFlowFlattener),
                Box::new(FunctionBodyEncryptor::new(cipher, printer)),
            ],
            pass_config: PassConfig::default(),
        }
    }
}
