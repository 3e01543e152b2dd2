//! Single read-only pass gathering the identifiers a module declares.
use crate::ast::{Expr, Module, NameCtx, Stmt};
use crate::visit::{descend_expr, descend_stmt, Visit};
use indexmap::IndexSet;

/// Identifiers found in one module, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedNames {
    /// Names bound by the module itself: `def` names and parameters, assignment, `for` and
    /// `with` targets. Only these are renamed.
    pub declared: IndexSet<String>,
    /// Every identifier read anywhere, plus identifier-like tokens inside opaque source.
    /// Replacements must avoid these so builtins and imports keep resolving.
    pub referenced: IndexSet<String>,
    /// Identifier-like tokens inside opaque source. Opaque text is never rewritten, so a
    /// declared name listed here has to keep its spelling.
    pub opaque: IndexSet<String>,
}

impl CollectedNames {
    /// Names that are read but never bound in the module (builtins, imports, globals
    /// defined elsewhere).
    pub fn external(&self) -> impl Iterator<Item = &String> {
        self.referenced
            .iter()
            .filter(|name| !self.declared.contains(*name))
    }

    /// Declared names that can be renamed: those never spelled out in opaque source.
    pub fn renamable(&self) -> impl Iterator<Item = &String> {
        self.declared
            .iter()
            .filter(|name| !self.opaque.contains(*name))
    }
}

/// Collects declared and referenced identifiers from `module`.
pub fn collect_names(module: &Module) -> CollectedNames {
    let mut collector = NameCollector::default();
    collector.visit_module(module);
    collector.names
}

#[derive(Default)]
struct NameCollector {
    names: CollectedNames,
}

impl NameCollector {
    /// Adds names bound by an assignment-like target, recursing through destructuring.
    fn bind_target(&mut self, target: &Expr) {
        match target {
            Expr::Name { id, .. } => {
                self.names.declared.insert(id.clone());
            }
            Expr::Tuple { elts } | Expr::List { elts } => {
                for elt in elts {
                    self.bind_target(elt);
                }
            }
            _ => {}
        }
    }

    fn reference_opaque(&mut self, source: &str) {
        let tokens = source
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|tok| tok.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'));
        for token in tokens {
            self.names.referenced.insert(token.to_string());
            self.names.opaque.insert(token.to_string());
        }
    }
}

impl Visit for NameCollector {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FunctionDef { name, params, .. } => {
                self.names.declared.insert(name.clone());
                self.names.declared.extend(params.iter().cloned());
            }
            Stmt::Assign { targets, .. } => targets.iter().for_each(|t| self.bind_target(t)),
            Stmt::For { target, .. } => self.bind_target(target),
            Stmt::With { items, .. } => {
                for binding in items.iter().filter_map(|item| item.binding.as_ref()) {
                    self.bind_target(binding);
                }
            }
            Stmt::Global { names } | Stmt::Nonlocal { names } => {
                self.names.referenced.extend(names.iter().cloned());
            }
            Stmt::Opaque { source } => self.reference_opaque(source),
            _ => {}
        }
        descend_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Name {
                id,
                ctx: NameCtx::Load,
            } => {
                self.names.referenced.insert(id.clone());
            }
            Expr::Opaque { source } => self.reference_opaque(source),
            _ => {}
        }
        descend_expr(self, expr);
    }
}
