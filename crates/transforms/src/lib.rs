pub mod context;
pub mod control_flow;
pub mod encrypt;
pub mod junk;
pub mod mapping;
pub mod obfuscator;
pub mod pass;
pub mod rename;
pub mod string_encoder;

pub use context::{NameMapping, PassContext};

use async_trait::async_trait;
use murk_core::ast::{Module, Stmt};
use murk_utils::errors::TransformError;
use serde::{Deserialize, Serialize};

/// Trait for syntax-tree obfuscation passes.
///
/// Every pass applies the run's identifier mapping to the nodes it visits, so renaming
/// happens no matter which passes are selected.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Returns the transform's name for logging and identification.
    fn name(&self) -> &'static str;

    /// Upper bound on the synthetic names this pass will draw from the reserved pool when
    /// run over `module`. Queried once, before the mapping is built.
    fn reserved_names(&self, _module: &Module) -> usize {
        0
    }

    /// Applies the transform to the module, returning whether changes were made.
    async fn apply(&self, module: &mut Module, ctx: &mut PassContext)
        -> Result<bool, TransformError>;

    /// Helper definitions this pass needs at the top of the module. The pipeline inserts
    /// each [`HelperKind`] at most once per run, after every pass has finished.
    fn auxiliary_definitions(&self, _ctx: &PassContext) -> Vec<AuxiliaryDefinition> {
        Vec::new()
    }
}

/// Shared runtime helpers that passes reference by a reserved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelperKind {
    /// Inverse of the string-literal shift cipher.
    Decode,
    /// Decrypts and materializes a sealed function body.
    Decrypt,
}

/// A helper definition contributed by a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryDefinition {
    pub kind: HelperKind,
    pub definition: Stmt,
}

/// Configuration for transform passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PassConfig {
    /// Extra reserved names requested on top of the passes' own estimates
    pub reserve_slack: usize,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self { reserve_slack: 16 }
    }
}
