use crate::{PassContext, Transform};
use async_trait::async_trait;
use murk_analysis::{collect_metrics, compare};
use murk_core::ast::Module;
use murk_utils::errors::TransformError;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of one pass as recorded by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub name: String,
    pub changed: bool,
    /// Potency delta between the trees before and after the pass.
    pub delta: f64,
}

/// Trait for running a sequence of obfuscation passes over a module.
#[async_trait]
pub trait Pass {
    async fn run(
        &self,
        module: &mut Module,
        passes: &[Box<dyn Transform>],
        ctx: &mut PassContext,
    ) -> Result<Vec<PassReport>, TransformError>;
}

/// Runs every pass in order. The first failing pass aborts the run.
pub struct DefaultPass;

#[async_trait]
impl Pass for DefaultPass {
    async fn run(
        &self,
        module: &mut Module,
        passes: &[Box<dyn Transform>],
        ctx: &mut PassContext,
    ) -> Result<Vec<PassReport>, TransformError> {
        let mut reports = Vec::with_capacity(passes.len());

        for pass in passes {
            let before = collect_metrics(module);
            let changed = pass.apply(module, ctx).await?;
            let after = collect_metrics(module);
            let delta = compare(&before, &after);

            info!(
                "{:>22} Δ{:+.2} {}",
                pass.name(),
                delta,
                if changed { "✓" } else { "·" }
            );

            reports.push(PassReport {
                name: pass.name().to_string(),
                changed,
                delta,
            });
        }
        Ok(reports)
    }
}

/// Convenience function to run the default pass.
pub async fn run(
    module: &mut Module,
    passes: &[Box<dyn Transform>],
    ctx: &mut PassContext,
) -> Result<Vec<PassReport>, TransformError> {
    DefaultPass.run(module, passes, ctx).await
}
