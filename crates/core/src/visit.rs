//! Depth-first traversal and rewriting over the syntax tree.
//!
//! [`Rewriter`] is the mutable half used by every pass. Visiting a statement yields a
//! [`Rewrite`], so one statement can be replaced by zero, one or many siblings while the
//! surrounding statements keep their positions. [`Visit`] is the read-only half used by
//! analyses such as name collection and metrics.
use crate::ast::{Expr, Module, Stmt};
use murk_utils::errors::TransformError;

/// Outcome of rewriting one statement inside its parent block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    NoChange,
    Replace(Stmt),
    /// Splice these statements into the parent block in place of the visited one.
    /// An empty list deletes the statement.
    ReplaceMany(Vec<Stmt>),
}

/// Mutable tree walker with an identifier hook.
///
/// The default methods descend into every child; implementors override the node kinds
/// they transform and call the matching `walk_*` function to keep descending.
pub trait Rewriter {
    /// Called for every Name node, `def` name, `def`/lambda parameter and
    /// `global`/`nonlocal` entry.
    fn rename(&mut self, _ident: &mut String) {}

    fn rewrite_module(&mut self, module: &mut Module) -> Result<(), TransformError> {
        self.rewrite_block(&mut module.body)
    }

    fn rewrite_block(&mut self, block: &mut Vec<Stmt>) -> Result<(), TransformError> {
        walk_block(self, block)
    }

    fn rewrite_stmt(&mut self, stmt: &mut Stmt) -> Result<Rewrite, TransformError> {
        walk_stmt(self, stmt)?;
        Ok(Rewrite::NoChange)
    }

    fn rewrite_expr(&mut self, expr: &mut Expr) -> Result<(), TransformError> {
        walk_expr(self, expr)
    }
}

/// Rewrites every statement of `block`, splicing replacements in order.
pub fn walk_block<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    block: &mut Vec<Stmt>,
) -> Result<(), TransformError> {
    let original = std::mem::take(block);
    block.reserve(original.len());
    for mut stmt in original {
        match rewriter.rewrite_stmt(&mut stmt)? {
            Rewrite::NoChange => block.push(stmt),
            Rewrite::Replace(new) => block.push(new),
            Rewrite::ReplaceMany(many) => block.extend(many),
        }
    }
    Ok(())
}

pub fn walk_stmt<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    stmt: &mut Stmt,
) -> Result<(), TransformError> {
    match stmt {
        Stmt::FunctionDef { name, params, body } => {
            rewriter.rename(name);
            for param in params.iter_mut() {
                rewriter.rename(param);
            }
            rewriter.rewrite_block(body)?;
        }
        Stmt::Assign { targets, value } => {
            for target in targets.iter_mut() {
                rewriter.rewrite_expr(target)?;
            }
            rewriter.rewrite_expr(value)?;
        }
        Stmt::For {
            target,
            iter,
            body,
            orelse,
        } => {
            rewriter.rewrite_expr(target)?;
            rewriter.rewrite_expr(iter)?;
            rewriter.rewrite_block(body)?;
            rewriter.rewrite_block(orelse)?;
        }
        Stmt::While { test, body, orelse } | Stmt::If { test, body, orelse } => {
            rewriter.rewrite_expr(test)?;
            rewriter.rewrite_block(body)?;
            rewriter.rewrite_block(orelse)?;
        }
        Stmt::With { items, body } => {
            for item in items.iter_mut() {
                rewriter.rewrite_expr(&mut item.context)?;
                if let Some(binding) = item.binding.as_mut() {
                    rewriter.rewrite_expr(binding)?;
                }
            }
            rewriter.rewrite_block(body)?;
        }
        Stmt::Return { value } => {
            if let Some(value) = value.as_mut() {
                rewriter.rewrite_expr(value)?;
            }
        }
        Stmt::Expr { value } => rewriter.rewrite_expr(value)?,
        Stmt::Global { names } | Stmt::Nonlocal { names } => {
            for name in names.iter_mut() {
                rewriter.rename(name);
            }
        }
        Stmt::Pass | Stmt::Break | Stmt::Continue | Stmt::Opaque { .. } => {}
    }
    Ok(())
}

pub fn walk_expr<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    expr: &mut Expr,
) -> Result<(), TransformError> {
    match expr {
        Expr::Name { id, .. } => rewriter.rename(id),
        Expr::Call { func, args } => {
            rewriter.rewrite_expr(func)?;
            for arg in args.iter_mut() {
                rewriter.rewrite_expr(arg)?;
            }
        }
        Expr::Lambda { params, body } => {
            for param in params.iter_mut() {
                rewriter.rename(param);
            }
            rewriter.rewrite_expr(body)?;
        }
        Expr::IfExp { test, body, orelse } => {
            rewriter.rewrite_expr(test)?;
            rewriter.rewrite_expr(body)?;
            rewriter.rewrite_expr(orelse)?;
        }
        Expr::Attribute { value, .. } => rewriter.rewrite_expr(value)?,
        Expr::BinOp { left, right, .. } => {
            rewriter.rewrite_expr(left)?;
            rewriter.rewrite_expr(right)?;
        }
        Expr::Tuple { elts } | Expr::List { elts } => {
            for elt in elts.iter_mut() {
                rewriter.rewrite_expr(elt)?;
            }
        }
        Expr::Str { .. } | Expr::Literal { .. } | Expr::Opaque { .. } => {}
    }
    Ok(())
}

/// Read-only tree walker.
pub trait Visit {
    fn visit_module(&mut self, module: &Module) {
        for stmt in &module.body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        descend_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        descend_expr(self, expr);
    }
}

pub fn descend_stmt<V: Visit + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::FunctionDef { body, .. } => body.iter().for_each(|s| visitor.visit_stmt(s)),
        Stmt::Assign { targets, value } => {
            targets.iter().for_each(|t| visitor.visit_expr(t));
            visitor.visit_expr(value);
        }
        Stmt::For {
            target,
            iter,
            body,
            orelse,
        } => {
            visitor.visit_expr(target);
            visitor.visit_expr(iter);
            body.iter().chain(orelse).for_each(|s| visitor.visit_stmt(s));
        }
        Stmt::While { test, body, orelse } | Stmt::If { test, body, orelse } => {
            visitor.visit_expr(test);
            body.iter().chain(orelse).for_each(|s| visitor.visit_stmt(s));
        }
        Stmt::With { items, body } => {
            for item in items {
                visitor.visit_expr(&item.context);
                if let Some(binding) = &item.binding {
                    visitor.visit_expr(binding);
                }
            }
            body.iter().for_each(|s| visitor.visit_stmt(s));
        }
        Stmt::Return { value: Some(value) } | Stmt::Expr { value } => visitor.visit_expr(value),
        Stmt::Return { value: None }
        | Stmt::Global { .. }
        | Stmt::Nonlocal { .. }
        | Stmt::Pass
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Opaque { .. } => {}
    }
}

pub fn descend_expr<V: Visit + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Call { func, args } => {
            visitor.visit_expr(func);
            args.iter().for_each(|a| visitor.visit_expr(a));
        }
        Expr::Lambda { body, .. } => visitor.visit_expr(body),
        Expr::IfExp { test, body, orelse } => {
            visitor.visit_expr(test);
            visitor.visit_expr(body);
            visitor.visit_expr(orelse);
        }
        Expr::Attribute { value, .. } => visitor.visit_expr(value),
        Expr::BinOp { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Tuple { elts } | Expr::List { elts } => elts.iter().for_each(|e| visitor.visit_expr(e)),
        Expr::Name { .. } | Expr::Str { .. } | Expr::Literal { .. } | Expr::Opaque { .. } => {}
    }
}
