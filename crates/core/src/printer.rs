//! Printer collaborator: renders a tree back to source text.
//!
//! The passes only depend on the [`Printer`] trait. [`SourcePrinter`] is the adapter
//! shipped with the crate; it emits Python-flavoured source and parenthesizes
//! conservatively so the output always re-parses with the same structure.
use crate::ast::{Expr, Module, Stmt};
use std::fmt::Write;

pub trait Printer: Send + Sync {
    /// Renders a whole module.
    fn unparse(&self, module: &Module) -> String;
}

#[derive(Debug, Clone)]
pub struct SourcePrinter {
    indent: String,
}

impl Default for SourcePrinter {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
        }
    }
}

impl Printer for SourcePrinter {
    fn unparse(&self, module: &Module) -> String {
        let mut out = String::new();
        self.write_block(&mut out, &module.body, 0, false);
        out
    }
}

impl SourcePrinter {
    pub fn with_indent(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
        }
    }

    fn line(&self, out: &mut String, depth: usize, text: &str) {
        for _ in 0..depth {
            out.push_str(&self.indent);
        }
        out.push_str(text);
        out.push('\n');
    }

    /// Writes `body` at `depth`. A nested empty block still needs a statement.
    fn write_block(&self, out: &mut String, body: &[Stmt], depth: usize, nested: bool) {
        if body.is_empty() && nested {
            self.line(out, depth, "pass");
        }
        for stmt in body {
            self.write_stmt(out, stmt, depth);
        }
    }

    fn write_stmt(&self, out: &mut String, stmt: &Stmt, depth: usize) {
        match stmt {
            Stmt::FunctionDef { name, params, body } => {
                self.line(out, depth, &format!("def {name}({}):", params.join(", ")));
                self.write_block(out, body, depth + 1, true);
            }
            Stmt::Assign { targets, value } => {
                let mut text = String::new();
                for target in targets {
                    let _ = write!(text, "{} = ", self.expr(target));
                }
                text.push_str(&self.expr(value));
                self.line(out, depth, &text);
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let header = format!("for {} in {}:", self.expr(target), self.expr(iter));
                self.line(out, depth, &header);
                self.write_block(out, body, depth + 1, true);
                self.write_else(out, orelse, depth);
            }
            Stmt::While { test, body, orelse } => {
                self.line(out, depth, &format!("while {}:", self.expr(test)));
                self.write_block(out, body, depth + 1, true);
                self.write_else(out, orelse, depth);
            }
            Stmt::With { items, body } => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| match &item.binding {
                        Some(binding) => {
                            format!("{} as {}", self.expr(&item.context), self.expr(binding))
                        }
                        None => self.expr(&item.context),
                    })
                    .collect();
                self.line(out, depth, &format!("with {}:", items.join(", ")));
                self.write_block(out, body, depth + 1, true);
            }
            Stmt::If { test, body, orelse } => self.write_if(out, "if", test, body, orelse, depth),
            Stmt::Return { value: None } => self.line(out, depth, "return"),
            Stmt::Return { value: Some(value) } => {
                self.line(out, depth, &format!("return {}", self.expr(value)))
            }
            Stmt::Expr { value } => self.line(out, depth, &self.expr(value)),
            Stmt::Global { names } => self.line(out, depth, &format!("global {}", names.join(", "))),
            Stmt::Nonlocal { names } => {
                self.line(out, depth, &format!("nonlocal {}", names.join(", ")))
            }
            Stmt::Pass => self.line(out, depth, "pass"),
            Stmt::Break => self.line(out, depth, "break"),
            Stmt::Continue => self.line(out, depth, "continue"),
            Stmt::Opaque { source } => {
                for raw in source.lines() {
                    self.line(out, depth, raw);
                }
            }
        }
    }

    fn write_if(
        &self,
        out: &mut String,
        keyword: &str,
        test: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        depth: usize,
    ) {
        self.line(out, depth, &format!("{keyword} {}:", self.expr(test)));
        self.write_block(out, body, depth + 1, true);
        match orelse {
            [] => {}
            [Stmt::If { test, body, orelse }] => self.write_if(out, "elif", test, body, orelse, depth),
            _ => self.write_else(out, orelse, depth),
        }
    }

    fn write_else(&self, out: &mut String, orelse: &[Stmt], depth: usize) {
        if !orelse.is_empty() {
            self.line(out, depth, "else:");
            self.write_block(out, orelse, depth + 1, true);
        }
    }

    /// Renders an expression in a context that accepts any expression.
    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Name { id, .. } => id.clone(),
            Expr::Str { value } => quote(value),
            Expr::Literal { source } | Expr::Opaque { source } => source.clone(),
            Expr::Call { func, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", self.atom(func), args.join(", "))
            }
            Expr::Lambda { params, body } => {
                if params.is_empty() {
                    format!("lambda: {}", self.expr(body))
                } else {
                    format!("lambda {}: {}", params.join(", "), self.expr(body))
                }
            }
            Expr::IfExp { test, body, orelse } => format!(
                "{} if {} else {}",
                self.operand(body),
                self.operand(test),
                match orelse.as_ref() {
                    Expr::Lambda { .. } => format!("({})", self.expr(orelse)),
                    _ => self.expr(orelse),
                }
            ),
            Expr::Attribute { value, attr } => match value.as_ref() {
                Expr::Literal { source } if source.starts_with(|c: char| c.is_ascii_digit()) => {
                    format!("({source}).{attr}")
                }
                _ => format!("{}.{attr}", self.atom(value)),
            },
            Expr::BinOp { left, op, right } => {
                format!("{} {op} {}", self.operand(left), self.operand(right))
            }
            Expr::Tuple { elts } => match elts.as_slice() {
                [single] => format!("({},)", self.expr(single)),
                _ => {
                    let elts: Vec<String> = elts.iter().map(|e| self.expr(e)).collect();
                    format!("({})", elts.join(", "))
                }
            },
            Expr::List { elts } => {
                let elts: Vec<String> = elts.iter().map(|e| self.expr(e)).collect();
                format!("[{}]", elts.join(", "))
            }
        }
    }

    /// Renders an expression in callee / attribute-base position.
    fn atom(&self, expr: &Expr) -> String {
        match expr {
            Expr::Name { .. }
            | Expr::Str { .. }
            | Expr::Literal { .. }
            | Expr::Call { .. }
            | Expr::Attribute { .. }
            | Expr::Tuple { .. }
            | Expr::List { .. } => self.expr(expr),
            _ => format!("({})", self.expr(expr)),
        }
    }

    /// Renders an operand of a binary or conditional expression.
    fn operand(&self, expr: &Expr) -> String {
        match expr {
            Expr::BinOp { .. } | Expr::IfExp { .. } | Expr::Lambda { .. } | Expr::Opaque { .. } => {
                format!("({})", self.expr(expr))
            }
            _ => self.expr(expr),
        }
    }
}

/// Quotes `value` as a single-quoted string literal.
///
/// ```
/// use murk_core::printer::quote;
///
/// assert_eq!(quote("it's"), r"'it\'s'");
/// assert_eq!(quote("a\nb"), r"'a\nb'");
/// ```
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let code = c as u32;
                let _ = match code {
                    0..=0xff => write!(out, "\\x{code:02x}"),
                    0x100..=0xffff => write!(out, "\\u{code:04x}"),
                    _ => write!(out, "\\U{code:08x}"),
                };
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
