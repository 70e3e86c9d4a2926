use crate::{
    ast::{Node, Op},
    error::{LangError, span},
    lex::{Token, TokenKind, tokenize},
    value::Value,
};

/// Recursive-descent parser over a fully lexed token buffer.
///
/// The buffer is never consumed; `cursor` marks the next token, so a failed
/// speculative parse is undone by restoring a saved cursor.
pub struct Parser<'de> {
    tokens: Vec<Token<'de>>,
    cursor: usize,
    end: usize,
}

pub fn parse(tokens: Vec<Token<'_>>) -> Result<Node, LangError> {
    Parser::from_tokens(tokens).parse()
}

impl<'de> Parser<'de> {
    pub fn new(whole: &'de str) -> Result<Self, LangError> {
        let tokens = tokenize(whole)?;
        Ok(Parser {
            tokens,
            cursor: 0,
            end: whole.len(),
        })
    }

    pub fn from_tokens(tokens: Vec<Token<'de>>) -> Self {
        let end = tokens.last().map_or(0, Token::end);
        Parser {
            tokens,
            cursor: 0,
            end,
        }
    }

    pub fn parse(mut self) -> Result<Node, LangError> {
        let program = self.statements()?;
        match self.peek() {
            None => Ok(program),
            Some(token) => Err(unexpected(token, "end of input")),
        }
    }

    fn peek(&self) -> Option<&Token<'de>> {
        self.tokens.get(self.cursor)
    }

    fn is_next(&self, kind: TokenKind, literals: &[&str]) -> bool {
        self.peek().is_some_and(|token| token.is(kind, literals))
    }

    fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    fn eof(&self, expected: String) -> LangError {
        LangError::UnexpectedEof {
            expected,
            span: span(self.end, 0),
        }
    }

    fn expect(&mut self, kind: TokenKind, literals: &[&str]) -> Result<Token<'de>, LangError> {
        let expected = if literals.is_empty() {
            format!("a {kind}")
        } else if let [literal] = literals {
            format!("a {kind} `{literal}`")
        } else {
            format!("one of {}", literals.join(", "))
        };

        let Some(token) = self.peek().copied() else {
            return Err(self.eof(expected));
        };
        if !token.is(kind, literals) {
            return Err(unexpected(&token, &expected));
        }
        self.cursor += 1;
        Ok(token)
    }

    // program := [statement {";" statement} [";"]]
    fn statements(&mut self) -> Result<Node, LangError> {
        let mut nodes = Vec::new();
        if self.at_end() {
            return Ok(Node::block(0, nodes));
        }
        loop {
            nodes.push(self.statement()?);
            if !self.is_next(TokenKind::Symbol, &[";"]) {
                break;
            }
            self.cursor += 1;
            if self.at_end() || self.is_next(TokenKind::Paren, &["}"]) {
                break;
            }
        }
        let position = nodes.first().map_or(0, |node| node.position);
        Ok(Node::block(position, nodes))
    }

    fn statement(&mut self) -> Result<Node, LangError> {
        if self.is_next(TokenKind::Ident, &["print"]) {
            let print = self.expect(TokenKind::Ident, &["print"])?;
            let expr = self.expression()?;
            return Ok(Node::call(print.offset, "print", vec![expr]));
        }
        if self.is_next(TokenKind::Keyword, &["let"]) || self.is_next(TokenKind::Ident, &["let"]) {
            self.cursor += 1;
            return self.assignment();
        }
        self.expression()
    }

    fn assignment(&mut self) -> Result<Node, LangError> {
        let name = self.expect(TokenKind::Ident, &[])?;
        self.expect(TokenKind::Operator, &[":="])?;
        let value = self.expression()?;
        Ok(Node::assign(name.offset, name.literal, value))
    }

    fn expression(&mut self) -> Result<Node, LangError> {
        if self.is_next(TokenKind::Symbol, &["\\"]) {
            self.lambda()
        } else if self.is_next(TokenKind::Keyword, &["if"]) {
            self.conditional()
        } else {
            self.equality()
        }
    }

    fn conditional(&mut self) -> Result<Node, LangError> {
        self.expect(TokenKind::Keyword, &["if"])?;
        let condition = self.equality()?;
        self.expect(TokenKind::Keyword, &["then"])?;
        let then_branch = self.expression()?;
        self.expect(TokenKind::Keyword, &["else"])?;
        let else_branch = self.expression()?;
        Ok(Node::conditional(condition, then_branch, else_branch))
    }

    fn lambda(&mut self) -> Result<Node, LangError> {
        let backslash = self.expect(TokenKind::Symbol, &["\\"])?;
        let mut params = Vec::new();
        while self.is_next(TokenKind::Ident, &[]) {
            params.push(self.expect(TokenKind::Ident, &[])?.literal.to_string());
        }
        self.expect(TokenKind::Operator, &["->"])?;
        let body = self.expression()?;
        Ok(Node::lambda(backslash.offset, params, body))
    }

    /// Parses `operand [op operand]` without chaining.
    fn binary_once(
        &mut self,
        ops: &[&str],
        operand: fn(&mut Self) -> Result<Node, LangError>,
    ) -> Result<Node, LangError> {
        let lhs = operand(self)?;
        if !self.is_next(TokenKind::Operator, ops) {
            return Ok(lhs);
        }
        let op = self.expect(TokenKind::Operator, ops)?;
        let rhs = operand(self)?;
        Ok(Node::operation(
            op.offset,
            Op::from_symbol(op.literal, op.offset)?,
            lhs,
            rhs,
        ))
    }

    /// Parses `operand {op operand}`, folding to the left.
    fn binary_chain(
        &mut self,
        ops: &[&str],
        operand: fn(&mut Self) -> Result<Node, LangError>,
    ) -> Result<Node, LangError> {
        let mut lhs = operand(self)?;
        while self.is_next(TokenKind::Operator, ops) {
            let op = self.expect(TokenKind::Operator, ops)?;
            let rhs = operand(self)?;
            lhs = Node::operation(op.offset, Op::from_symbol(op.literal, op.offset)?, lhs, rhs);
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Node, LangError> {
        self.binary_once(&["=", "!="], Self::relational)
    }

    fn relational(&mut self) -> Result<Node, LangError> {
        self.binary_once(&[">", "<", ">=", "<="], Self::add_sub)
    }

    fn add_sub(&mut self) -> Result<Node, LangError> {
        self.binary_chain(&["+", "-"], Self::term)
    }

    fn term(&mut self) -> Result<Node, LangError> {
        self.binary_chain(&["*", "/"], Self::factor)
    }

    fn factor(&mut self) -> Result<Node, LangError> {
        if self.is_next(TokenKind::Paren, &["("]) {
            self.cursor += 1;
            let expr = self.expression()?;
            self.expect(TokenKind::Paren, &[")"])?;
            Ok(expr)
        } else if self.is_next(TokenKind::Paren, &["{"]) {
            self.cursor += 1;
            if let Some(token) = self.peek().copied() {
                if token.is(TokenKind::Paren, &["}"]) {
                    return Err(unexpected(&token, "a statement"));
                }
            }
            let block = self.statements()?;
            self.expect(TokenKind::Paren, &["}"])?;
            Ok(block)
        } else if self.is_next(TokenKind::Ident, &[]) {
            let ident = self.expect(TokenKind::Ident, &[])?;
            let args = self.arguments();
            if args.is_empty() {
                Ok(Node::reference(ident.offset, ident.literal))
            } else {
                Ok(Node::call(ident.offset, ident.literal, args))
            }
        } else {
            self.number()
        }
    }

    /// Greedily collects call arguments. Each attempt starts from a saved
    /// cursor; the first failing attempt is rolled back and ends the list.
    fn arguments(&mut self) -> Vec<Node> {
        let mut args = Vec::new();
        while !self.at_end() && !self.is_next(TokenKind::Symbol, &[";"]) {
            let checkpoint = self.cursor;
            match self.expression() {
                Ok(arg) => args.push(arg),
                Err(_) => {
                    self.cursor = checkpoint;
                    break;
                }
            }
        }
        args
    }

    fn number(&mut self) -> Result<Node, LangError> {
        let token = self.expect(TokenKind::Number, &[])?;
        let n: f64 = token.literal.parse().unwrap_or(f64::INFINITY);
        Ok(Node::value(token.offset, Value::Number(n)))
    }
}

fn unexpected(token: &Token<'_>, expected: &str) -> LangError {
    LangError::Syntax {
        found: format!("{}({})", token.literal, token.kind),
        expected: expected.to_string(),
        span: span(token.offset, token.literal.len()),
    }
}
