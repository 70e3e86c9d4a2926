pub mod ast;
pub mod error;
pub mod eval;
pub mod lex;
pub mod memory;
pub mod parse;
pub mod value;

pub use error::LangError;
pub use eval::Interpreter;
pub use lex::{Lexer, tokenize};
pub use parse::{Parser, parse};
pub use value::Value;

/// Runs a whole program with `print` going to stdout.
pub fn run(source: &str) -> Result<Value, LangError> {
    Interpreter::stdout().run(source)
}
