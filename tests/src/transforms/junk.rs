use super::{apply, programs};
use crate::interp;
use async_trait::async_trait;
use murk_core::ast::Stmt;
use murk_core::JsonTreeParser;
use murk_oracle::FragmentOracle;
use murk_transform::junk::{fallback_fragment, JunkCodeInserter, FALLBACK_NAME};
use murk_utils::errors::OracleError;
use std::sync::Arc;

struct Timeout;

#[async_trait]
impl FragmentOracle for Timeout {
    async fn generate_fragment(&self) -> Result<String, OracleError> {
        Err(OracleError::Timeout(30_000))
    }
}

#[tokio::test]
async fn test_junk_does_not_change_output() {
    for original in programs() {
        let expected = interp::run(&original).unwrap();
        let mut module = original.clone();
        apply(&JunkCodeInserter::new(), &mut module).await;

        assert_eq!(module.body.len(), original.body.len() + 1);
        assert!(matches!(module.body[0], Stmt::FunctionDef { .. }));
        assert_eq!(interp::run(&module).unwrap(), expected);
    }
}

#[tokio::test]
async fn test_oracle_timeout_falls_back() {
    let mut module = super::early_return();
    let pass = JunkCodeInserter::new()
        .with_oracle(Arc::new(Timeout), Arc::new(JsonTreeParser))
        .with_rename(false);
    apply(&pass, &mut module).await;

    assert_eq!(module.body[0], fallback_fragment());
    assert_eq!(module.body[0].def_name(), Some(FALLBACK_NAME));
}
