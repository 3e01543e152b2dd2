//! Behavioral checks: a program must print the same lines before and after a pass.
use murk_core::ast::{Expr, Module, Stmt};
use murk_oracle::NameGenerator;
use murk_transform::mapping::build_mapping;
use murk_transform::{PassConfig, PassContext, Transform};

mod junk;
mod strings;

pub(crate) fn print(args: Vec<Expr>) -> Stmt {
    Stmt::expr(Expr::call(Expr::load("print"), args))
}

pub(crate) fn op(left: Expr, op: &str, right: Expr) -> Expr {
    Expr::BinOp {
        left: Box::new(left),
        op: op.to_string(),
        right: Box::new(right),
    }
}

pub(crate) fn int(n: i64) -> Expr {
    Expr::literal(n.to_string())
}

/// Runs `pass` alone the way the pipeline would: mapping built offline, pool sized from the
/// pass's own estimate.
pub(crate) async fn apply(pass: &dyn Transform, module: &mut Module) -> PassContext {
    let collected = murk_core::collect_names(module);
    let reserve = pass.reserved_names(module) + PassConfig::default().reserve_slack;
    let mapping = build_mapping(&collected, reserve, &NameGenerator::offline()).await;
    let mut ctx = PassContext::new(mapping);
    pass.apply(module, &mut ctx).await.unwrap();
    ctx
}

/// ```text
/// x = <cond>
/// if x:
///     y = 'yes'
/// else:
///     y = 'no'
/// print(y)
/// if x:
///     print('no else')
/// ```
pub(crate) fn module_level_branches(cond: i64) -> Module {
    Module::new(vec![
        Stmt::assign("x", int(cond)),
        Stmt::If {
            test: Expr::load("x"),
            body: vec![Stmt::assign("y", Expr::str("yes"))],
            orelse: vec![Stmt::assign("y", Expr::str("no"))],
        },
        print(vec![Expr::load("y")]),
        Stmt::If {
            test: Expr::load("x"),
            body: vec![print(vec![Expr::str("no else")])],
            orelse: vec![],
        },
    ])
}

/// ```text
/// def classify(n):
///     label = 'small'
///     if n > 10:
///         label = 'big'
///         if n > 100:
///             label = 'huge'
///     return label
/// print(classify(5)); print(classify(50)); print(classify(500))
/// ```
pub(crate) fn nested_function_branches() -> Module {
    let classify = Stmt::def(
        "classify",
        vec!["n".into()],
        vec![
            Stmt::assign("label", Expr::str("small")),
            Stmt::If {
                test: op(Expr::load("n"), ">", int(10)),
                body: vec![
                    Stmt::assign("label", Expr::str("big")),
                    Stmt::If {
                        test: op(Expr::load("n"), ">", int(100)),
                        body: vec![Stmt::assign("label", Expr::str("huge"))],
                        orelse: vec![],
                    },
                ],
                orelse: vec![],
            },
            Stmt::ret(Expr::load("label")),
        ],
    );
    let mut body = vec![classify];
    for n in [5, 50, 500] {
        body.push(print(vec![Expr::call(Expr::load("classify"), vec![int(n)])]));
    }
    Module::new(body)
}

/// ```text
/// total = 0
/// for i in range(6):
///     if i % 2 == 0:
///         total = total + i
///     else:
///         print(i)
/// print(total)
/// ```
pub(crate) fn loop_with_branches() -> Module {
    Module::new(vec![
        Stmt::assign("total", int(0)),
        Stmt::For {
            target: Expr::store("i"),
            iter: Expr::call(Expr::load("range"), vec![int(6)]),
            body: vec![Stmt::If {
                test: op(op(Expr::load("i"), "%", int(2)), "==", int(0)),
                body: vec![Stmt::assign(
                    "total",
                    op(Expr::load("total"), "+", Expr::load("i")),
                )],
                orelse: vec![print(vec![Expr::load("i")])],
            }],
            orelse: vec![],
        },
        print(vec![Expr::load("total")]),
    ])
}

/// ```text
/// def sign(n):
///     if n < 0:
///         return 'neg'
///     return 'pos'
/// print(sign(0 - 1)); print(sign(3))
/// ```
pub(crate) fn early_return() -> Module {
    Module::new(vec![
        Stmt::def(
            "sign",
            vec!["n".into()],
            vec![
                Stmt::If {
                    test: op(Expr::load("n"), "<", int(0)),
                    body: vec![Stmt::ret(Expr::str("neg"))],
                    orelse: vec![],
                },
                Stmt::ret(Expr::str("pos")),
            ],
        ),
        print(vec![Expr::call(
            Expr::load("sign"),
            vec![op(int(0), "-", int(1))],
        )]),
        print(vec![Expr::call(Expr::load("sign"), vec![int(3)])]),
    ])
}

pub(crate) fn programs() -> Vec<Module> {
    vec![
        module_level_branches(1),
        module_level_branches(0),
        nested_function_branches(),
        loop_with_branches(),
        early_return(),
    ]
}
