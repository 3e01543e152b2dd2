//! Reference evaluator for the modelled statement subset.
//!
//! Scoping follows the host language closely enough for the passes under test: functions
//! close over their defining frame, module-level assignments land in the globals, and
//! `global`/`nonlocal` redirect stores. The only opaque expression understood is the
//! generator inside the string decode helper. Output is whatever `print` produced, one
//! entry per call.
use murk_core::ast::{Expr, Module, Stmt};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

const STEP_LIMIT: usize = 200_000;

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Func(Rc<Function>),
    Builtin(&'static str),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Func(a), Self::Func(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(items) => {
                let items: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Self::Func(func) => write!(f, "<function {}>", func.name),
            Self::Builtin(name) => write!(f, "<built-in function {name}>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl Value {
    fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Func(_) | Self::Builtin(_) => true,
        }
    }
}

pub struct Function {
    name: String,
    params: Vec<String>,
    body: Vec<Stmt>,
    closure: Env,
}

type Env = Rc<RefCell<Frame>>;

#[derive(Default)]
struct Frame {
    vars: HashMap<String, Value>,
    globals: HashSet<String>,
    nonlocals: HashSet<String>,
    parent: Option<Env>,
}

enum Flow {
    Next,
    Return(Value),
    Break,
    Continue,
}

/// Runs `module` and returns the lines it printed.
pub fn run(module: &Module) -> Result<Vec<String>, String> {
    let mut interp = Interpreter {
        globals: Rc::new(RefCell::new(Frame::default())),
        output: Vec::new(),
        steps: 0,
    };
    let env = interp.globals.clone();
    match interp.exec_block(&module.body, &env)? {
        Flow::Next => Ok(interp.output),
        _ => Err("return, break or continue at module level".to_string()),
    }
}

struct Interpreter {
    globals: Env,
    output: Vec<String>,
    steps: usize,
}

impl Interpreter {
    fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> Result<Flow, String> {
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> Result<Flow, String> {
        self.steps += 1;
        if self.steps > STEP_LIMIT {
            return Err("step limit exceeded".to_string());
        }

        match stmt {
            Stmt::FunctionDef { name, params, body } => {
                let func = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: env.clone(),
                };
                self.store(env, name, Value::Func(Rc::new(func)))?;
            }
            Stmt::Assign { targets, value } => {
                let value = self.eval(value, env)?;
                for target in targets {
                    self.assign(target, value.clone(), env)?;
                }
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let items = match self.eval(iter, env)? {
                    Value::List(items) => items,
                    Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
                    other => return Err(format!("cannot iterate over {other}")),
                };
                for item in items {
                    self.assign(target, item, env)?;
                    match self.exec_block(body, env)? {
                        Flow::Break => return Ok(Flow::Next),
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Next | Flow::Continue => {}
                    }
                }
                return self.exec_block(orelse, env);
            }
            Stmt::While { test, body, orelse } => {
                while self.eval(test, env)?.truthy() {
                    match self.exec_block(body, env)? {
                        Flow::Break => return Ok(Flow::Next),
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Next | Flow::Continue => {}
                    }
                }
                return self.exec_block(orelse, env);
            }
            Stmt::If { test, body, orelse } => {
                return if self.eval(test, env)?.truthy() {
                    self.exec_block(body, env)
                } else {
                    self.exec_block(orelse, env)
                };
            }
            Stmt::Return { value } => {
                let value = match value {
                    Some(value) => self.eval(value, env)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Expr { value } => {
                self.eval(value, env)?;
            }
            Stmt::Global { names } => env.borrow_mut().globals.extend(names.iter().cloned()),
            Stmt::Nonlocal { names } => env.borrow_mut().nonlocals.extend(names.iter().cloned()),
            Stmt::Pass => {}
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::With { .. } | Stmt::Opaque { .. } => {
                return Err(format!("unsupported statement {stmt:?}"));
            }
        }
        Ok(Flow::Next)
    }

    fn assign(&mut self, target: &Expr, value: Value, env: &Env) -> Result<(), String> {
        match target {
            Expr::Name { id, .. } => self.store(env, id, value),
            Expr::Tuple { elts } | Expr::List { elts } => {
                let Value::List(items) = value else {
                    return Err(format!("cannot unpack {value}"));
                };
                if items.len() != elts.len() {
                    return Err("unpack length mismatch".to_string());
                }
                for (elt, item) in elts.iter().zip(items) {
                    self.assign(elt, item, env)?;
                }
                Ok(())
            }
            other => Err(format!("unsupported assignment target {other:?}")),
        }
    }

    fn store(&mut self, env: &Env, name: &str, value: Value) -> Result<(), String> {
        let (global, nonlocal) = {
            let frame = env.borrow();
            (
                frame.parent.is_none() || frame.globals.contains(name),
                frame.nonlocals.contains(name),
            )
        };

        if global {
            self.globals.borrow_mut().vars.insert(name.to_string(), value);
            return Ok(());
        }
        if !nonlocal {
            env.borrow_mut().vars.insert(name.to_string(), value);
            return Ok(());
        }

        let mut scope = env.borrow().parent.clone();
        while let Some(frame) = scope {
            if frame.borrow().parent.is_none() {
                break;
            }
            let owns = {
                let f = frame.borrow();
                !f.nonlocals.contains(name) && f.vars.contains_key(name)
            };
            if owns {
                frame.borrow_mut().vars.insert(name.to_string(), value);
                return Ok(());
            }
            scope = frame.borrow().parent.clone();
        }
        Err(format!("no binding for nonlocal '{name}'"))
    }

    fn load(&self, env: &Env, name: &str) -> Result<Value, String> {
        if env.borrow().globals.contains(name) {
            if let Some(value) = self.globals.borrow().vars.get(name) {
                return Ok(value.clone());
            }
        } else {
            let mut scope = Some(env.clone());
            while let Some(frame) = scope {
                if let Some(value) = frame.borrow().vars.get(name) {
                    return Ok(value.clone());
                }
                scope = frame.borrow().parent.clone();
            }
        }

        match name {
            "print" => Ok(Value::Builtin("print")),
            "len" => Ok(Value::Builtin("len")),
            "range" => Ok(Value::Builtin("range")),
            "str" => Ok(Value::Builtin("str")),
            _ => Err(format!("name '{name}' is not defined")),
        }
    }

    fn call(&mut self, func: Value, args: Vec<Value>) -> Result<Value, String> {
        match func {
            Value::Func(func) => {
                if func.params.len() != args.len() {
                    return Err(format!(
                        "{}() takes {} arguments, got {}",
                        func.name,
                        func.params.len(),
                        args.len()
                    ));
                }
                let frame = Frame {
                    vars: func.params.iter().cloned().zip(args).collect(),
                    parent: Some(func.closure.clone()),
                    ..Frame::default()
                };
                let env = Rc::new(RefCell::new(frame));
                match self.exec_block(&func.body, &env)? {
                    Flow::Return(value) => Ok(value),
                    Flow::Next => Ok(Value::None),
                    Flow::Break | Flow::Continue => Err("break outside loop".to_string()),
                }
            }
            Value::Builtin("print") => {
                let parts: Vec<String> = args.iter().map(Value::to_string).collect();
                self.output.push(parts.join(" "));
                Ok(Value::None)
            }
            Value::Builtin("len") => match args.as_slice() {
                [Value::Str(s)] => Ok(Value::Int(s.chars().count() as i64)),
                [Value::List(items)] => Ok(Value::Int(items.len() as i64)),
                _ => Err("len() expects one sized argument".to_string()),
            },
            Value::Builtin("range") => match args.as_slice() {
                [Value::Int(n)] => Ok(Value::List((0..*n).map(Value::Int).collect())),
                _ => Err("range() expects one integer".to_string()),
            },
            Value::Builtin("str") => match args.as_slice() {
                [value] => Ok(Value::Str(value.to_string())),
                _ => Err("str() expects one argument".to_string()),
            },
            other => Err(format!("{other} is not callable")),
        }
    }

    fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value, String> {
        match expr {
            Expr::Name { id, .. } => self.load(env, id),
            Expr::Str { value } => Ok(Value::Str(value.clone())),
            Expr::Literal { source } => match source.as_str() {
                "None" => Ok(Value::None),
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                n => n
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| format!("unsupported literal {n}")),
            },
            Expr::Call { func, args } => {
                if let Expr::Attribute { value, attr } = func.as_ref() {
                    let receiver = self.eval(value, env)?;
                    let args = self.eval_all(args, env)?;
                    return join(receiver, attr, args);
                }
                let func = self.eval(func, env)?;
                let args = self.eval_all(args, env)?;
                self.call(func, args)
            }
            Expr::Lambda { params, body } => Ok(Value::Func(Rc::new(Function {
                name: "<lambda>".to_string(),
                params: params.clone(),
                body: vec![Stmt::ret((**body).clone())],
                closure: env.clone(),
            }))),
            Expr::IfExp { test, body, orelse } => {
                if self.eval(test, env)?.truthy() {
                    self.eval(body, env)
                } else {
                    self.eval(orelse, env)
                }
            }
            Expr::BinOp { left, op, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                binop(&left, op, &right)
            }
            Expr::Tuple { elts } | Expr::List { elts } => Ok(Value::List(self.eval_all(elts, env)?)),
            Expr::Opaque { source } => self.decode_generator(source, env),
            Expr::Attribute { attr, .. } => Err(format!("unsupported attribute access .{attr}")),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], env: &Env) -> Result<Vec<Value>, String> {
        exprs.iter().map(|e| self.eval(e, env)).collect()
    }

    /// `chr(ord(c) - N) for c in VAR`, evaluated eagerly to a string.
    fn decode_generator(&mut self, source: &str, env: &Env) -> Result<Value, String> {
        let unsupported = || format!("unsupported opaque expression {source}");
        let rest = source.strip_prefix("chr(ord(c) - ").ok_or_else(unsupported)?;
        let (shift, var) = rest.split_once(") for c in ").ok_or_else(unsupported)?;
        let shift: u32 = shift.parse().map_err(|_| unsupported())?;

        let Value::Str(text) = self.load(env, var)? else {
            return Err(format!("{var} is not a string"));
        };
        text.chars()
            .map(|c| u32::from(c).checked_sub(shift).and_then(char::from_u32))
            .collect::<Option<String>>()
            .map(Value::Str)
            .ok_or_else(|| "chr() arg not in range".to_string())
    }
}

fn join(receiver: Value, attr: &str, args: Vec<Value>) -> Result<Value, String> {
    let (Value::Str(sep), "join", [arg]) = (receiver, attr, args.as_slice()) else {
        return Err(format!("unsupported method .{attr}"));
    };
    match arg {
        Value::Str(s) => {
            let chars: Vec<String> = s.chars().map(String::from).collect();
            Ok(Value::Str(chars.join(sep.as_str())))
        }
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(Value::to_string).collect();
            Ok(Value::Str(parts.join(sep.as_str())))
        }
        other => Err(format!("cannot join {other}")),
    }
}

fn binop(left: &Value, op: &str, right: &Value) -> Result<Value, String> {
    use Value::{Bool, Int, Str};
    Ok(match (left, op, right) {
        (Int(a), "+", Int(b)) => Int(a + b),
        (Int(a), "-", Int(b)) => Int(a - b),
        (Int(a), "*", Int(b)) => Int(a * b),
        (Int(a), "%", Int(b)) if *b != 0 => Int(a.rem_euclid(*b)),
        (Int(a), "<", Int(b)) => Bool(a < b),
        (Int(a), ">", Int(b)) => Bool(a > b),
        (Str(a), "+", Str(b)) => Str(format!("{a}{b}")),
        (a, "==", b) => Bool(a == b),
        (a, "!=", b) => Bool(a != b),
        _ => return Err(format!("unsupported operation {left:?} {op} {right:?}")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print(args: Vec<Expr>) -> Stmt {
        Stmt::expr(Expr::call(Expr::load("print"), args))
    }

    #[test]
    fn test_closures_and_nonlocal() {
        // def counter():
        //     n = 0
        //     def bump():
        //         nonlocal n
        //         n = n + 1
        //     bump(); bump()
        //     return n
        // print(counter())
        let bump = Stmt::def(
            "bump",
            vec![],
            vec![
                Stmt::Nonlocal {
                    names: vec!["n".into()],
                },
                Stmt::assign(
                    "n",
                    Expr::BinOp {
                        left: Box::new(Expr::load("n")),
                        op: "+".into(),
                        right: Box::new(Expr::literal("1")),
                    },
                ),
            ],
        );
        let module = Module::new(vec![
            Stmt::def(
                "counter",
                vec![],
                vec![
                    Stmt::assign("n", Expr::literal("0")),
                    bump,
                    Stmt::expr(Expr::call(Expr::load("bump"), vec![])),
                    Stmt::expr(Expr::call(Expr::load("bump"), vec![])),
                    Stmt::ret(Expr::load("n")),
                ],
            ),
            print(vec![Expr::call(Expr::load("counter"), vec![])]),
        ]);
        assert_eq!(run(&module).unwrap(), ["2"]);
    }

    #[test]
    fn test_global_declaration_and_decode_generator() {
        let module = Module::new(vec![
            Stmt::def(
                "set_y",
                vec![],
                vec![
                    Stmt::Global {
                        names: vec!["y".into()],
                    },
                    Stmt::assign("y", Expr::str("set")),
                ],
            ),
            Stmt::expr(Expr::call(Expr::load("set_y"), vec![])),
            Stmt::def(
                "d",
                vec!["s".into()],
                vec![Stmt::ret(Expr::call(
                    Expr::attr(Expr::str(""), "join"),
                    vec![Expr::opaque("chr(ord(c) - 1) for c in s")],
                ))],
            ),
            print(vec![
                Expr::load("y"),
                Expr::call(Expr::load("d"), vec![Expr::str("ij")]),
            ]),
        ]);
        assert_eq!(run(&module).unwrap(), ["set hi"]);
    }

    #[test]
    fn test_undefined_name_is_an_error() {
        let module = Module::new(vec![print(vec![Expr::load("missing")])]);
        assert!(run(&module).unwrap_err().contains("missing"));
    }
}
