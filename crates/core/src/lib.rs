pub mod ast;
pub mod collector;
pub mod ident;
pub mod parser;
pub mod printer;
pub mod visit;

pub use ast::{Expr, Module, NameCtx, Stmt, WithItem};
pub use collector::{collect_names, CollectedNames};
pub use parser::{JsonTreeParser, Parser};
pub use printer::{Printer, SourcePrinter};
