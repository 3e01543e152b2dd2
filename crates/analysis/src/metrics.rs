/// Module for computing analytical metrics to evaluate syntax-tree obfuscation passes.
///
/// Implements a small set of structural measures (statement and function counts, branch
/// count, literal count, nesting depth, identifier diversity) and a composite potency score
/// approximating reader effort. The pass runner collects metrics before and after each pass
/// and logs the delta.
///
/// # Usage
/// ```rust,ignore
/// let before = metrics::collect_metrics(&module);
/// run_pass(&mut module);
/// let after = metrics::collect_metrics(&module);
/// println!("potency delta {:+.2}", metrics::compare(&before, &after));
/// ```
use murk_core::ast::{Expr, Module, Stmt};
use murk_core::printer::{Printer, SourcePrinter};
use murk_core::visit::{descend_expr, descend_stmt, Visit};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::HashSet;

/// Represents a set of structural metrics for one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Total statements at any depth.
    pub stmt_cnt: usize,
    /// Function definitions at any depth.
    pub function_cnt: usize,
    /// `if` statements plus conditional expressions.
    pub branch_cnt: usize,
    /// Plain string literals still visible in the tree.
    pub string_cnt: usize,
    /// Calls at any depth.
    pub call_cnt: usize,
    /// Deepest statement nesting level (module body is depth 1).
    pub max_depth: usize,
    /// Number of distinct identifiers appearing in Name nodes and binding sites.
    pub distinct_idents: usize,
    /// Composite potency score (heuristic based on the counts above).
    pub potency: f64,
}

/// Collects metrics from a module.
pub fn collect_metrics(module: &Module) -> Metrics {
    let mut counter = Counter::default();
    for stmt in &module.body {
        counter.visit_stmt(stmt);
    }

    let mut metrics = Metrics {
        stmt_cnt: counter.stmts,
        function_cnt: counter.functions,
        branch_cnt: counter.branches,
        string_cnt: counter.strings,
        call_cnt: counter.calls,
        max_depth: counter.max_depth,
        distinct_idents: counter.idents.len(),
        potency: 0.0,
    };
    metrics.potency = score(&metrics);
    metrics
}

/// Returns the change in potency from `before` to `after`.
pub fn compare(before: &Metrics, after: &Metrics) -> f64 {
    after.potency - before.potency
}

/// Keccak-256 fingerprint of the module as rendered by the default printer.
pub fn digest(module: &Module) -> String {
    let source = SourcePrinter::default().unparse(module);
    let mut hasher = Keccak256::new();
    hasher.update(source.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// Indirection (calls, functions) and nesting weigh most; visible strings lower the score.
fn score(m: &Metrics) -> f64 {
    let indirection = (m.call_cnt + 2 * m.function_cnt) as f64;
    let structure = (m.stmt_cnt + m.branch_cnt) as f64 + 1.5 * m.max_depth as f64;
    let exposure = m.string_cnt as f64 * 0.5;
    (indirection + structure - exposure).max(0.0)
}

#[derive(Default)]
struct Counter {
    stmts: usize,
    functions: usize,
    branches: usize,
    strings: usize,
    calls: usize,
    depth: usize,
    max_depth: usize,
    idents: HashSet<String>,
}

impl Visit for Counter {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        self.stmts += 1;
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        match stmt {
            Stmt::FunctionDef { name, params, .. } => {
                self.functions += 1;
                self.idents.insert(name.clone());
                self.idents.extend(params.iter().cloned());
            }
            Stmt::If { .. } => self.branches += 1,
            _ => {}
        }
        descend_stmt(self, stmt);
        self.depth -= 1;
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Name { id, .. } => {
                self.idents.insert(id.clone());
            }
            Expr::Str { .. } => self.strings += 1,
            Expr::Call { .. } => self.calls += 1,
            Expr::IfExp { .. } => self.branches += 1,
            _ => {}
        }
        descend_expr(self, expr);
    }
}
