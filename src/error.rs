use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum LangError {
    #[error("Unexpected character '{ch}'")]
    #[diagnostic(
        code(lex::unexpected_character),
        help("remove or correct the character: `{ch}`")
    )]
    UnexpectedCharacter {
        ch: char,
        #[label("this character")]
        span: SourceSpan,
    },

    #[error("\"{found}\" should be {expected}")]
    #[diagnostic(code(parse::syntax))]
    Syntax {
        found: String,
        expected: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Unexpected end of file, input should continue with {expected}")]
    #[diagnostic(
        code(parse::eof),
        help("The file ended unexpectedly, possibly due to a missing closing brace or parenthesis.")
    )]
    UnexpectedEof {
        expected: String,
        #[label("input ends here")]
        span: SourceSpan,
    },

    #[error("Unexpected operator {symbol}")]
    #[diagnostic(code(parse::unknown_operator))]
    UnknownOperator {
        symbol: String,
        #[label("this operator")]
        span: SourceSpan,
    },

    #[error("variable {name} hasn't been bound to any value")]
    #[diagnostic(code(eval::unbound_variable), help("bind it first with `let {name} := ...`"))]
    UnboundVariable {
        name: String,
        #[label("not found in any scope")]
        span: SourceSpan,
    },

    #[error("Arity of \"{name}\" is {expected}, but {given} given")]
    #[diagnostic(code(eval::arity_mismatch))]
    ArityMismatch {
        name: String,
        expected: usize,
        given: usize,
        #[label("called here")]
        span: SourceSpan,
    },

    #[error("\"{name}\" is not a function, it is bound to {found}")]
    #[diagnostic(code(eval::not_callable))]
    NotCallable {
        name: String,
        found: String,
        #[label("called here")]
        span: SourceSpan,
    },

    #[error("Invalid operand for `{op}`: {found}")]
    #[diagnostic(code(eval::type_mismatch))]
    TypeMismatch {
        op: String,
        found: String,
        #[label("in this operation")]
        span: SourceSpan,
    },

    #[error("Division by zero")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero {
        #[label("divisor is zero")]
        span: SourceSpan,
    },

    #[error("Unexpected node: {details}")]
    #[diagnostic(code(eval::unexpected_node))]
    UnexpectedNode {
        details: String,
        #[label("this node")]
        span: SourceSpan,
    },

    #[error("failed to write output: {message}")]
    #[diagnostic(code(eval::output))]
    Output {
        message: String,
        #[label("while printing this")]
        span: SourceSpan,
    },
}

impl LangError {
    pub fn span(&self) -> SourceSpan {
        match self {
            LangError::UnexpectedCharacter { span, .. }
            | LangError::Syntax { span, .. }
            | LangError::UnexpectedEof { span, .. }
            | LangError::UnknownOperator { span, .. }
            | LangError::UnboundVariable { span, .. }
            | LangError::ArityMismatch { span, .. }
            | LangError::NotCallable { span, .. }
            | LangError::TypeMismatch { span, .. }
            | LangError::DivisionByZero { span }
            | LangError::UnexpectedNode { span, .. }
            | LangError::Output { span, .. } => *span,
        }
    }

    /// Offset of the offending source character.
    pub fn position(&self) -> usize {
        self.span().offset()
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn line_column(&self, source: &str) -> (usize, usize) {
        line_column(source, self.position())
    }
}

/// Converts an offset into a 1-based `(line, column)`. `\r` does not advance
/// the column.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        match c {
            '\n' => {
                line += 1;
                column = 1;
            }
            '\r' => {}
            _ => column += 1,
        }
    }
    (line, column)
}

pub(crate) fn span(position: usize, len: usize) -> SourceSpan {
    (position, len).into()
}
