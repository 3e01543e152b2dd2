//! Identifier substitution shared by every pass.
use crate::{PassContext, Transform};
use async_trait::async_trait;
use murk_core::ast::Module;
use murk_core::visit::Rewriter;
use murk_utils::errors::TransformError;
use tracing::debug;

/// Applies the run's mapping to every identifier node and nothing else.
///
/// The pipeline always runs this first, so a run with no selected passes still renames.
#[derive(Debug, Default, Clone, Copy)]
pub struct Renamer;

#[async_trait]
impl Transform for Renamer {
    fn name(&self) -> &'static str {
        "Renamer"
    }

    async fn apply(
        &self,
        module: &mut Module,
        ctx: &mut PassContext,
    ) -> Result<bool, TransformError> {
        let renamed = rename_module(module, ctx)?;
        debug!("Renamed {renamed} identifier occurrences");
        Ok(renamed > 0)
    }
}

/// Substitutes mapped identifiers throughout `module`, returning how many changed.
pub fn rename_module(module: &mut Module, ctx: &PassContext) -> Result<usize, TransformError> {
    let mut substitution = Substitution { ctx, renamed: 0 };
    substitution.rewrite_module(module)?;
    Ok(substitution.renamed)
}

struct Substitution<'a> {
    ctx: &'a PassContext,
    renamed: usize,
}

impl Rewriter for Substitution<'_> {
    fn rename(&mut self, ident: &mut String) {
        if self.ctx.mapping().get(ident).is_some() {
            self.ctx.substitute(ident);
            self.renamed += 1;
        }
    }
}
