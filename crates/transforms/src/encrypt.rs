//! Seals function bodies with a symmetric cipher, decrypted and re-materialized on call.
//!
//! Each outermost `def name(params): body` is printed, encrypted under the run's key and
//! replaced by
//!
//! ```text
//! def name(params):
//!     return unseal('<blob>', '<key>', globals())(params)
//! ```
//!
//! where `unseal` executes the decrypted definition in a fresh namespace over the module
//! globals and returns the resulting function. The original body runs unchanged inside
//! that function, so `return`, recursion and global lookups behave as before.
use crate::rename::rename_module;
use crate::{AuxiliaryDefinition, HelperKind, PassContext, Transform};
use async_trait::async_trait;
use murk_core::ast::{Expr, Module, Stmt};
use murk_core::printer::Printer;
use murk_core::visit::{walk_stmt, Rewrite, Rewriter};
use murk_oracle::cipher::Cipher;
use murk_utils::errors::TransformError;
use std::sync::Arc;
use tracing::debug;

const NAME: &str = "FunctionBodyEncryptor";

pub struct FunctionBodyEncryptor {
    cipher: Arc<dyn Cipher>,
    printer: Arc<dyn Printer>,
}

impl std::fmt::Debug for FunctionBodyEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionBodyEncryptor").finish_non_exhaustive()
    }
}

impl FunctionBodyEncryptor {
    pub fn new(cipher: Arc<dyn Cipher>, printer: Arc<dyn Printer>) -> Self {
        Self { cipher, printer }
    }

    /// `def <name>(blob, key, scope)` executing the decrypted definition and returning it.
    fn unseal_helper(&self, name: &str) -> Stmt {
        let mut body: Vec<Stmt> = self
            .cipher
            .runtime_imports()
            .into_iter()
            .map(Stmt::opaque)
            .collect();
        body.push(Stmt::assign("namespace", Expr::opaque("{}")));
        body.push(Stmt::expr(Expr::call(
            Expr::load("exec"),
            vec![
                Expr::opaque(self.cipher.runtime_decrypt_expr("blob", "key")),
                Expr::load("scope"),
                Expr::load("namespace"),
            ],
        )));
        body.push(Stmt::ret(Expr::opaque("namespace.popitem()[1]")));
        Stmt::def(
            name,
            vec!["blob".to_string(), "key".to_string(), "scope".to_string()],
            body,
        )
    }
}

#[async_trait]
impl Transform for FunctionBodyEncryptor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reserved_names(&self, _module: &Module) -> usize {
        1
    }

    async fn apply(
        &self,
        module: &mut Module,
        ctx: &mut PassContext,
    ) -> Result<bool, TransformError> {
        rename_module(module, ctx)?;

        let mut sealer = Sealer {
            ctx,
            cipher: self.cipher.as_ref(),
            printer: self.printer.as_ref(),
            sealed: 0,
        };
        sealer.rewrite_module(module)?;

        debug!("Encrypted {} function bodies", sealer.sealed);
        Ok(sealer.sealed > 0)
    }

    fn auxiliary_definitions(&self, ctx: &PassContext) -> Vec<AuxiliaryDefinition> {
        ctx.helper(HelperKind::Decrypt)
            .map(|name| AuxiliaryDefinition {
                kind: HelperKind::Decrypt,
                definition: self.unseal_helper(name),
            })
            .into_iter()
            .collect()
    }
}

struct Sealer<'a> {
    ctx: &'a mut PassContext,
    cipher: &'a dyn Cipher,
    printer: &'a dyn Printer,
    sealed: usize,
}

impl Sealer<'_> {
    fn seal(
        &mut self,
        name: &str,
        params: &[String],
        body: &mut Vec<Stmt>,
    ) -> Result<(), TransformError> {
        let key = self.ctx.cipher_key(self.cipher)?;
        let helper = self.ctx.helper_name(HelperKind::Decrypt, NAME)?;

        let definition = Stmt::def(name, params.to_vec(), std::mem::take(body));
        let plaintext = self.printer.unparse(&Module::new(vec![definition]));
        let blob = self.cipher.encrypt(&plaintext, &key)?;
        if self.cipher.decrypt(&blob, &key)? != plaintext {
            return Err(TransformError::RoundTripMismatch(name.to_string()));
        }

        let unseal = Expr::call(
            Expr::load(helper),
            vec![
                Expr::str(blob),
                Expr::str(self.cipher.key_literal(&key)),
                Expr::call(Expr::load("globals"), Vec::new()),
            ],
        );
        let args = params.iter().map(|p| Expr::load(p.as_str())).collect();
        *body = vec![Stmt::ret(Expr::call(unseal, args))];

        debug!("  sealed {name} ({} bytes)", plaintext.len());
        self.sealed += 1;
        Ok(())
    }
}

impl Rewriter for Sealer<'_> {
    fn rewrite_stmt(&mut self, stmt: &mut Stmt) -> Result<Rewrite, TransformError> {
        match stmt {
            Stmt::FunctionDef { name, params, body } => {
                let name = name.clone();
                self.seal(&name, params, body)?;
            }
            _ => walk_stmt(self, stmt)?,
        }
        Ok(Rewrite::NoChange)
    }
}
