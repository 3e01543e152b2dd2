//! Inserts one never-called function definition at the top of the module.
use crate::rename::rename_module;
use crate::{PassContext, Transform};
use async_trait::async_trait;
use murk_core::ast::{Expr, Module, Stmt};
use murk_core::parser::Parser;
use murk_oracle::fragments::FragmentOracle;
use murk_utils::errors::TransformError;
use std::sync::Arc;
use tracing::{debug, warn};

const NAME: &str = "JunkCodeInserter";

/// Name of the built-in fragment used when no usable fragment is produced.
pub const FALLBACK_NAME: &str = "default_junk_func";

/// Prepends a junk function drawn from a [`FragmentOracle`].
///
/// The fragment's source is validated with the configured [`Parser`]; it must start with a
/// function definition, and only that definition is inserted. Any failure along the way
/// falls back to [`fallback_fragment`]. The inserted function is renamed from the reserved
/// pool unless renaming is disabled and its own name is free.
#[derive(Clone)]
pub struct JunkCodeInserter {
    oracle: Option<Arc<dyn FragmentOracle>>,
    parser: Option<Arc<dyn Parser>>,
    rename: bool,
}

impl std::fmt::Debug for JunkCodeInserter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JunkCodeInserter")
            .field("oracle", &self.oracle.is_some())
            .field("parser", &self.parser.is_some())
            .field("rename", &self.rename)
            .finish()
    }
}

impl Default for JunkCodeInserter {
    fn default() -> Self {
        Self::new()
    }
}

impl JunkCodeInserter {
    /// Inserter that always uses the built-in fragment.
    pub fn new() -> Self {
        Self {
            oracle: None,
            parser: None,
            rename: true,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn FragmentOracle>, parser: Arc<dyn Parser>) -> Self {
        self.oracle = Some(oracle);
        self.parser = Some(parser);
        self
    }

    pub const fn with_rename(mut self, rename: bool) -> Self {
        self.rename = rename;
        self
    }

    async fn fragment(&self) -> Stmt {
        let (Some(oracle), Some(parser)) = (&self.oracle, &self.parser) else {
            debug!("No fragment oracle configured, using built-in junk");
            return fallback_fragment();
        };

        let source = match oracle.generate_fragment().await {
            Ok(source) => source,
            Err(e) => {
                warn!("fragment oracle failed, using built-in junk: {e}");
                return fallback_fragment();
            }
        };

        match parser.parse(&source) {
            Ok(module) => match module.body.into_iter().next() {
                Some(def @ Stmt::FunctionDef { .. }) => def,
                _ => {
                    warn!("fragment is not a function definition, using built-in junk");
                    fallback_fragment()
                }
            },
            Err(e) => {
                warn!("fragment failed to parse, using built-in junk: {e}");
                fallback_fragment()
            }
        }
    }
}

/// `def default_junk_func(data): return len(data)`
pub fn fallback_fragment() -> Stmt {
    Stmt::def(
        FALLBACK_NAME,
        vec!["data".to_string()],
        vec![Stmt::ret(Expr::call(
            Expr::load("len"),
            vec![Expr::load("data")],
        ))],
    )
}

#[async_trait]
impl Transform for JunkCodeInserter {
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
        let mut junk = self.fragment().await;

        if let Stmt::FunctionDef { name, .. } = &mut junk {
            if self.rename || ctx.mapping().is_taken(name) {
                *name = ctx.take_reserved(NAME)?;
            }
            debug!("Inserting junk function {name}");
        }

        module.body.insert(0, junk);
        rename_module(module, ctx)?;
        Ok(true)
    }
}
