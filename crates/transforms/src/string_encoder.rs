//! Replaces string literals with calls to a decode helper over shift-encoded text.
use crate::rename::rename_module;
use crate::{AuxiliaryDefinition, HelperKind, PassContext, Transform};
use async_trait::async_trait;
use murk_core::ast::{Expr, Module, Stmt};
use murk_core::visit::{descend_expr, walk_expr, Rewriter, Visit};
use murk_utils::errors::TransformError;
use tracing::debug;

/// Code-point offset applied to every character of an encoded literal.
pub const SHIFT: u32 = 1;

/// Shifts every character of `text` up by [`SHIFT`].
///
/// Returns `None` when some character has no shifted counterpart (the last code point
/// before the surrogate range, or the last code point overall); such literals stay as
/// they are.
///
/// ```
/// use murk_transform::string_encoder::{decode_text, encode_text};
///
/// assert_eq!(encode_text("hi").as_deref(), Some("ij"));
/// assert_eq!(decode_text("ij").as_deref(), Some("hi"));
/// assert_eq!(encode_text("\u{10FFFF}"), None);
/// ```
pub fn encode_text(text: &str) -> Option<String> {
    text.chars()
        .map(|c| char::from_u32(u32::from(c) + SHIFT))
        .collect()
}

/// Inverse of [`encode_text`].
pub fn decode_text(text: &str) -> Option<String> {
    text.chars()
        .map(|c| u32::from(c).checked_sub(SHIFT).and_then(char::from_u32))
        .collect()
}

/// Encodes each string literal and wraps it in a call to the decode helper.
///
/// The helper is named from the reserved pool and defined once per run, and only when at
/// least one literal was encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringLiteralEncoder;

const NAME: &str = "StringLiteralEncoder";

#[async_trait]
impl Transform for StringLiteralEncoder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reserved_names(&self, module: &Module) -> usize {
        let mut finder = StrFinder(false);
        finder.visit_module(module);
        usize::from(finder.0)
    }

    async fn apply(
        &self,
        module: &mut Module,
        ctx: &mut PassContext,
    ) -> Result<bool, TransformError> {
        rename_module(module, ctx)?;

        let mut encoder = Encoder {
            ctx,
            encoded: 0,
            skipped: 0,
        };
        encoder.rewrite_module(module)?;

        debug!(
            "Encoded {} string literals ({} left unencodable)",
            encoder.encoded, encoder.skipped
        );
        Ok(encoder.encoded > 0)
    }

    fn auxiliary_definitions(&self, ctx: &PassContext) -> Vec<AuxiliaryDefinition> {
        ctx.helper(HelperKind::Decode)
            .map(|name| AuxiliaryDefinition {
                kind: HelperKind::Decode,
                definition: decode_helper(name),
            })
            .into_iter()
            .collect()
    }
}

/// `def <name>(s): return ''.join(chr(ord(c) - SHIFT) for c in s)`
fn decode_helper(name: &str) -> Stmt {
    let join = Expr::attr(Expr::str(""), "join");
    let chars = Expr::opaque(format!("chr(ord(c) - {SHIFT}) for c in s"));
    Stmt::def(
        name,
        vec!["s".to_string()],
        vec![Stmt::ret(Expr::call(join, vec![chars]))],
    )
}

struct Encoder<'a> {
    ctx: &'a mut PassContext,
    encoded: usize,
    skipped: usize,
}

impl Rewriter for Encoder<'_> {
    fn rewrite_expr(&mut self, expr: &mut Expr) -> Result<(), TransformError> {
        let Expr::Str { value } = expr else {
            return walk_expr(self, expr);
        };
        let Some(shifted) = encode_text(value) else {
            self.skipped += 1;
            return Ok(());
        };
        let helper = self.ctx.helper_name(HelperKind::Decode, NAME)?;
        *expr = Expr::call(Expr::load(helper), vec![Expr::str(shifted)]);
        self.encoded += 1;
        Ok(())
    }
}

struct StrFinder(bool);

impl Visit for StrFinder {
    fn visit_expr(&mut self, expr: &Expr) {
        if matches!(expr, Expr::Str { .. }) {
            self.0 = true;
        } else if !self.0 {
            descend_expr(self, expr);
        }
    }
}
