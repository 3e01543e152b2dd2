//! Loading input trees, either serialized directly or produced by an external parser.
use murk_core::ast::Module;
use murk_core::parser::{JsonTreeParser, Parser};
use murk_utils::errors::{ObfuscateError, ParseError};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Parser front end run as a subprocess: source text on stdin, JSON tree on stdout.
#[derive(Debug, Clone)]
pub struct CommandParser {
    program: String,
    args: Vec<String>,
}

impl CommandParser {
    /// Splits `command` on whitespace into a program and its arguments.
    pub fn new(command: &str) -> Result<Self, ParseError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ParseError::Syntax("empty parser command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Parser for CommandParser {
    fn parse(&self, source: &str) -> Result<Module, ParseError> {
        debug!("Running parser {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // a parser may exit without draining its input
            if let Err(e) = stdin.write_all(source.as_bytes()) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParseError::Syntax(stderr.trim().to_string()));
        }

        JsonTreeParser.parse(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads `path` as a tree: `*.json` files are serialized trees, anything else goes through
/// `parser`.
pub fn load_module(path: &Path, parser: Option<&CommandParser>) -> Result<Module, ObfuscateError> {
    let text = std::fs::read_to_string(path)?;
    let is_tree = path.extension().and_then(|ext| ext.to_str()) == Some("json");

    let module = match (is_tree, parser) {
        (true, _) => JsonTreeParser.parse(&text)?,
        (false, Some(parser)) => parser.parse(&text)?,
        (false, None) => {
            return Err(ObfuscateError::Config(format!(
                "{} is not a .json tree; pass --parser-cmd to parse source",
                path.display()
            )))
        }
    };
    debug!("Loaded {} top-level statements from {}", module.body.len(), path.display());
    Ok(module)
}
