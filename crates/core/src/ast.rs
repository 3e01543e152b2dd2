//! Syntax tree model the obfuscation passes operate on.
//!
//! The tree covers the structural subset the passes understand: modules, function
//! definitions, assignments, loops, context managers, conditionals, literals and calls.
//! Everything else is carried as `Opaque` source text and survives every pass untouched.
//!
//! Trees serialize as internally tagged JSON, which is the exchange format an external
//! parser front-end produces:
//!
//! ```json
//! {"body": [{"kind": "Assign",
//!            "targets": [{"kind": "Name", "id": "x", "ctx": "Store"}],
//!            "value": {"kind": "Literal", "source": "1"}}]}
//! ```
use serde::{Deserialize, Serialize};

/// A whole compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

/// Whether a name is read or bound at its position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameCtx {
    #[default]
    Load,
    Store,
}

/// One `context [as binding]` clause of a `with` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithItem {
    pub context: Expr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    FunctionDef {
        name: String,
        #[serde(default)]
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
    },
    Expr {
        value: Expr,
    },
    Global {
        names: Vec<String>,
    },
    Nonlocal {
        names: Vec<String>,
    },
    Pass,
    Break,
    Continue,
    /// A statement outside the modelled subset, kept as raw source lines.
    Opaque {
        source: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    Name {
        id: String,
        #[serde(default)]
        ctx: NameCtx,
    },
    Str {
        value: String,
    },
    /// Numbers, booleans, `None`: any literal that is not a string.
    Literal {
        source: String,
    },
    Call {
        func: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Lambda {
        #[serde(default)]
        params: Vec<String>,
        body: Box<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    BinOp {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
    },
    Tuple {
        elts: Vec<Expr>,
    },
    List {
        elts: Vec<Expr>,
    },
    /// An expression outside the modelled subset, kept as raw source.
    Opaque {
        source: String,
    },
}

impl Expr {
    pub fn load(id: impl Into<String>) -> Self {
        Self::Name {
            id: id.into(),
            ctx: NameCtx::Load,
        }
    }

    pub fn store(id: impl Into<String>) -> Self {
        Self::Name {
            id: id.into(),
            ctx: NameCtx::Store,
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::Str {
            value: value.into(),
        }
    }

    pub fn literal(source: impl Into<String>) -> Self {
        Self::Literal {
            source: source.into(),
        }
    }

    pub fn opaque(source: impl Into<String>) -> Self {
        Self::Opaque {
            source: source.into(),
        }
    }

    pub fn call(func: Self, args: Vec<Self>) -> Self {
        Self::Call {
            func: Box::new(func),
            args,
        }
    }

    pub fn attr(value: Self, attr: impl Into<String>) -> Self {
        Self::Attribute {
            value: Box::new(value),
            attr: attr.into(),
        }
    }
}

impl Stmt {
    pub fn expr(value: Expr) -> Self {
        Self::Expr { value }
    }

    pub fn def(name: impl Into<String>, params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self::FunctionDef {
            name: name.into(),
            params,
            body,
        }
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Self::Assign {
            targets: vec![Expr::store(target)],
            value,
        }
    }

    pub fn ret(value: Expr) -> Self {
        Self::Return { value: Some(value) }
    }

    pub fn opaque(source: impl Into<String>) -> Self {
        Self::Opaque {
            source: source.into(),
        }
    }

    /// Name bound by a `def`, if this is one.
    pub fn def_name(&self) -> Option<&str> {
        match self {
            Self::FunctionDef { name, .. } => Some(name),
            _ => None,
        }
    }
}
