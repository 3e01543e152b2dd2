//! Replaces each conditional with two wrapper functions and a selector call.
//!
//! ```text
//! if test:          def then_():         # reserved names
//!     body              body
//! else:         →   def else_():
//!     orelse            orelse | pass
//!                   (then_ if test else else_)()
//! ```
//!
//! Moving a branch into a function changes the scope its assignments land in. Wrappers
//! therefore declare every name their branches bind: `global` at module level (or where
//! the enclosing function already declares it global), `nonlocal` inside a function when
//! the name is bound there outside any conditional. A conditional whose branches cannot be
//! moved without changing meaning is left in place and only its children are visited:
//!
//! - a branch contains `return`, or a `break`/`continue` that leaves the branch
//! - a branch contains `global`/`nonlocal` or an opaque statement
//! - a branch binds a function-local name with no binding outside the conditional
//! - an opaque expression in a branch may yield, await or assign
use crate::rename::rename_module;
use crate::{PassContext, Transform};
use async_trait::async_trait;
use indexmap::IndexSet;
use murk_core::ast::{Expr, Module, Stmt};
use murk_core::visit::{descend_expr, descend_stmt, walk_stmt, Rewrite, Rewriter, Visit};
use murk_utils::errors::TransformError;
use tracing::debug;

const NAME: &str = "ControlFlowFlattener";

#[derive(Debug, Default, Clone, Copy)]
pub struct ControlFlowFlattener;

#[async_trait]
impl Transform for ControlFlowFlattener {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reserved_names(&self, module: &Module) -> usize {
        let mut counter = IfCounter(0);
        counter.visit_module(module);
        2 * counter.0
    }

    async fn apply(
        &self,
        module: &mut Module,
        ctx: &mut PassContext,
    ) -> Result<bool, TransformError> {
        rename_module(module, ctx)?;

        let mut flattener = Flattener {
            ctx,
            module_scope: Scope::default(),
            scopes: Vec::new(),
            flattened: 0,
            kept: 0,
        };
        flattener.rewrite_module(module)?;

        debug!(
            "Flattened {} conditionals, kept {}",
            flattener.flattened, flattener.kept
        );
        Ok(flattener.flattened > 0)
    }
}

struct IfCounter(usize);

impl Visit for IfCounter {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if matches!(stmt, Stmt::If { .. }) {
            self.0 += 1;
        }
        descend_stmt(self, stmt);
    }
}

/// Name-resolution facts about the function (or module) a statement runs in.
#[derive(Debug, Default)]
struct Scope {
    function: bool,
    /// Names declared `global` in this function.
    globals: IndexSet<String>,
    /// Names a nested wrapper may declare `nonlocal`: parameters, names bound outside any
    /// conditional, and names this function itself declares `nonlocal`.
    anchors: IndexSet<String>,
}

impl Scope {
    fn function(params: &[String], body: &[Stmt]) -> Self {
        let mut scan = LevelScan::default();
        scan.block(body, false);
        let mut anchors: IndexSet<String> = params.iter().cloned().collect();
        anchors.extend(scan.unconditional);
        anchors.extend(scan.nonlocals);
        Self {
            function: true,
            globals: scan.globals,
            anchors,
        }
    }
}

/// Declarations a pair of wrappers needs.
#[derive(Debug, Default)]
struct Plan {
    globals: Vec<String>,
    nonlocals: Vec<String>,
}

impl Plan {
    fn declarations(&self) -> Vec<Stmt> {
        let mut decls = Vec::new();
        if !self.globals.is_empty() {
            decls.push(Stmt::Global {
                names: self.globals.clone(),
            });
        }
        if !self.nonlocals.is_empty() {
            decls.push(Stmt::Nonlocal {
                names: self.nonlocals.clone(),
            });
        }
        decls
    }

    fn scope(&self) -> Scope {
        Scope {
            function: true,
            globals: self.globals.iter().cloned().collect(),
            anchors: self.nonlocals.iter().cloned().collect(),
        }
    }
}

struct Flattener<'a> {
    ctx: &'a mut PassContext,
    module_scope: Scope,
    scopes: Vec<Scope>,
    flattened: usize,
    kept: usize,
}

impl Flattener<'_> {
    fn scope(&self) -> &Scope {
        self.scopes.last().unwrap_or(&self.module_scope)
    }

    fn plan(&self, body: &[Stmt], orelse: &[Stmt]) -> Result<Plan, &'static str> {
        let mut scan = BranchScan::default();
        scan.block(body, 0);
        scan.block(orelse, 0);
        if let Some(reason) = scan.escape {
            return Err(reason);
        }

        let scope = self.scope();
        let mut plan = Plan::default();
        for name in scan.bound {
            if !scope.function || scope.globals.contains(&name) {
                plan.globals.push(name);
            } else if scope.anchors.contains(&name) {
                plan.nonlocals.push(name);
            } else {
                return Err("binds a name local to the conditional");
            }
        }
        Ok(plan)
    }

    /// Rewrites `block` with `scope` as the innermost scope.
    fn within(&mut self, scope: Scope, block: &mut Vec<Stmt>) -> Result<(), TransformError> {
        self.scopes.push(scope);
        let result = self.rewrite_block(block);
        self.scopes.pop();
        result
    }

    fn flatten(
        &mut self,
        test: &mut Expr,
        body: &mut Vec<Stmt>,
        orelse: &mut Vec<Stmt>,
    ) -> Result<Rewrite, TransformError> {
        self.rewrite_expr(test)?;

        let plan = match self.plan(body, orelse) {
            Ok(plan) => plan,
            Err(reason) => {
                debug!("Keeping conditional in place: {reason}");
                self.kept += 1;
                self.rewrite_block(body)?;
                self.rewrite_block(orelse)?;
                return Ok(Rewrite::NoChange);
            }
        };

        let then_name = self.ctx.take_reserved(NAME)?;
        let else_name = self.ctx.take_reserved(NAME)?;

        let mut then_body = plan.declarations();
        then_body.append(body);
        let mut else_body = plan.declarations();
        if orelse.is_empty() {
            else_body.push(Stmt::Pass);
        } else {
            else_body.append(orelse);
        }

        self.within(plan.scope(), &mut then_body)?;
        self.within(plan.scope(), &mut else_body)?;
        self.flattened += 1;

        let selector = Expr::IfExp {
            test: Box::new(std::mem::replace(test, Expr::literal("None"))),
            body: Box::new(Expr::load(then_name.clone())),
            orelse: Box::new(Expr::load(else_name.clone())),
        };
        Ok(Rewrite::ReplaceMany(vec![
            Stmt::def(then_name, Vec::new(), then_body),
            Stmt::def(else_name, Vec::new(), else_body),
            Stmt::expr(Expr::call(selector, Vec::new())),
        ]))
    }
}

impl Rewriter for Flattener<'_> {
    fn rewrite_stmt(&mut self, stmt: &mut Stmt) -> Result<Rewrite, TransformError> {
        match stmt {
            Stmt::FunctionDef { params, body, .. } => {
                let scope = Scope::function(params, body);
                self.within(scope, body)?;
                Ok(Rewrite::NoChange)
            }
            Stmt::If { test, body, orelse } => self.flatten(test, body, orelse),
            _ => {
                walk_stmt(self, stmt)?;
                Ok(Rewrite::NoChange)
            }
        }
    }
}

/// Collects the names bound by an assignment-like target.
fn bind_target(target: &Expr, out: &mut IndexSet<String>) {
    match target {
        Expr::Name { id, .. } => {
            out.insert(id.clone());
        }
        Expr::Tuple { elts } | Expr::List { elts } => {
            for elt in elts {
                bind_target(elt, out);
            }
        }
        _ => {}
    }
}

/// Bindings and declarations at one function level, not descending into nested `def`s.
#[derive(Debug, Default)]
struct LevelScan {
    unconditional: IndexSet<String>,
    globals: IndexSet<String>,
    nonlocals: IndexSet<String>,
}

impl LevelScan {
    fn block(&mut self, stmts: &[Stmt], conditional: bool) {
        for stmt in stmts {
            self.stmt(stmt, conditional);
        }
    }

    fn bind(&mut self, target: &Expr, conditional: bool) {
        if !conditional {
            bind_target(target, &mut self.unconditional);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, conditional: bool) {
        match stmt {
            Stmt::FunctionDef { name, .. } => {
                if !conditional {
                    self.unconditional.insert(name.clone());
                }
            }
            Stmt::Assign { targets, .. } => {
                for target in targets {
                    self.bind(target, conditional);
                }
            }
            Stmt::For {
                target,
                body,
                orelse,
                ..
            } => {
                self.bind(target, conditional);
                self.block(body, conditional);
                self.block(orelse, conditional);
            }
            Stmt::While { body, orelse, .. } => {
                self.block(body, conditional);
                self.block(orelse, conditional);
            }
            Stmt::With { items, body } => {
                for binding in items.iter().filter_map(|item| item.binding.as_ref()) {
                    self.bind(binding, conditional);
                }
                self.block(body, conditional);
            }
            Stmt::If { body, orelse, .. } => {
                self.block(body, true);
                self.block(orelse, true);
            }
            Stmt::Global { names } => self.globals.extend(names.iter().cloned()),
            Stmt::Nonlocal { names } => self.nonlocals.extend(names.iter().cloned()),
            Stmt::Return { .. }
            | Stmt::Expr { .. }
            | Stmt::Pass
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Opaque { .. } => {}
        }
    }
}

/// What moving a branch into a function would disturb.
#[derive(Debug, Default)]
struct BranchScan {
    bound: IndexSet<String>,
    escape: Option<&'static str>,
}

impl BranchScan {
    fn block(&mut self, stmts: &[Stmt], loops: usize) {
        for stmt in stmts {
            if self.escape.is_some() {
                return;
            }
            self.stmt(stmt, loops);
        }
    }

    fn flag(&mut self, reason: &'static str) {
        self.escape.get_or_insert(reason);
    }

    fn expr(&mut self, expr: &Expr) {
        let mut probe = OpaqueProbe(false);
        probe.visit_expr(expr);
        if probe.0 {
            self.flag("opaque expression may yield, await or assign");
        }
    }

    fn stmt(&mut self, stmt: &Stmt, loops: usize) {
        match stmt {
            Stmt::FunctionDef { name, .. } => {
                self.bound.insert(name.clone());
            }
            Stmt::Assign { targets, value } => {
                for target in targets {
                    bind_target(target, &mut self.bound);
                    self.expr(target);
                }
                self.expr(value);
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                bind_target(target, &mut self.bound);
                self.expr(iter);
                self.block(body, loops + 1);
                self.block(orelse, loops);
            }
            Stmt::While { test, body, orelse } => {
                self.expr(test);
                self.block(body, loops + 1);
                self.block(orelse, loops);
            }
            Stmt::With { items, body } => {
                for item in items {
                    self.expr(&item.context);
                    if let Some(binding) = &item.binding {
                        bind_target(binding, &mut self.bound);
                    }
                }
                self.block(body, loops);
            }
            Stmt::If { test, body, orelse } => {
                self.expr(test);
                self.block(body, loops);
                self.block(orelse, loops);
            }
            Stmt::Expr { value } => self.expr(value),
            Stmt::Return { .. } => self.flag("branch returns"),
            Stmt::Break | Stmt::Continue if loops == 0 => {
                self.flag("branch leaves an enclosing loop")
            }
            Stmt::Global { .. } | Stmt::Nonlocal { .. } => {
                self.flag("branch declares its own scope")
            }
            Stmt::Opaque { .. } => self.flag("branch holds an opaque statement"),
            Stmt::Break | Stmt::Continue | Stmt::Pass => {}
        }
    }
}

/// Finds opaque expressions that could suspend the frame or bind a name.
struct OpaqueProbe(bool);

impl Visit for OpaqueProbe {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Opaque { source } = expr {
            let suspends = source
                .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .any(|w| w == "yield" || w == "await");
            if suspends || source.contains(":=") {
                self.0 = true;
            }
        }
        descend_expr(self, expr);
    }
}
