pub mod ast;
pub mod ast_printer;
pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use error::RunError;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Runs `source` end to end: scan, parse, resolve, execute.
///
/// Static errors from any front stage are gathered and returned together
/// without executing anything.  Execution stops at the first runtime error.
pub fn run(source: &str, output: Box<dyn Write>) -> Result<(), RunError> {
    let (tokens, mut diagnostics) = Scanner::new(source).scan_all();

    let statements = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,
        Err(parse_errors) => {
            diagnostics.extend(parse_errors);
            return Err(RunError::Static(diagnostics));
        }
    };

    if diagnostics.has_errors() {
        return Err(RunError::Static(diagnostics));
    }

    let locals = Resolver::new()
        .resolve(&statements)
        .map_err(RunError::Static)?;

    info!("Program is well-formed; executing");

    let mut interpreter = Interpreter::with_output(output);
    interpreter
        .interpret(&statements, locals)
        .map_err(RunError::Runtime)
}
