use std::{fmt::Display, rc::Rc};

use crate::{
    error::{LangError, span},
    value::Value,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: usize,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Statements {
        mode: StatementsMode,
        nodes: Vec<Node>,
    },
    Operation {
        op: Op,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Value(Value),
    Reference(String),
    Assign {
        name: String,
        value: Rc<Node>,
    },
    Lambda {
        params: Vec<String>,
        body: Rc<Node>,
    },
    Call {
        callee: String,
        args: Vec<Node>,
    },
    Conditional {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementsMode {
    Block,
    /// `nodes[0]` is the repeat count, `nodes[1]` the body.
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    BangEqual,
}

impl Op {
    pub fn from_symbol(symbol: &str, position: usize) -> Result<Op, LangError> {
        Ok(match symbol {
            "+" => Op::Plus,
            "-" => Op::Minus,
            "*" => Op::Star,
            "/" => Op::Slash,
            ">" => Op::Greater,
            "<" => Op::Less,
            ">=" => Op::GreaterEqual,
            "<=" => Op::LessEqual,
            "=" => Op::Equal,
            "!=" => Op::BangEqual,
            _ => {
                return Err(LangError::UnknownOperator {
                    symbol: symbol.to_string(),
                    span: span(position, symbol.len()),
                });
            }
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
            Op::Greater => ">",
            Op::Less => "<",
            Op::GreaterEqual => ">=",
            Op::LessEqual => "<=",
            Op::Equal => "=",
            Op::BangEqual => "!=",
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Node {
    pub fn new(position: usize, kind: NodeKind) -> Self {
        Node { position, kind }
    }

    pub fn block(position: usize, nodes: Vec<Node>) -> Self {
        Node::new(
            position,
            NodeKind::Statements {
                mode: StatementsMode::Block,
                nodes,
            },
        )
    }

    pub fn repeat(position: usize, count: Node, body: Node) -> Self {
        Node::new(
            position,
            NodeKind::Statements {
                mode: StatementsMode::Loop,
                nodes: vec![count, body],
            },
        )
    }

    pub fn value(position: usize, value: impl Into<Value>) -> Self {
        Node::new(position, NodeKind::Value(value.into()))
    }

    pub fn reference(position: usize, name: impl Into<String>) -> Self {
        Node::new(position, NodeKind::Reference(name.into()))
    }

    pub fn operation(position: usize, op: Op, lhs: Node, rhs: Node) -> Self {
        Node::new(
            position,
            NodeKind::Operation {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    }

    pub fn assign(position: usize, name: impl Into<String>, value: Node) -> Self {
        Node::new(
            position,
            NodeKind::Assign {
                name: name.into(),
                value: Rc::new(value),
            },
        )
    }

    pub fn lambda(position: usize, params: Vec<String>, body: Node) -> Self {
        Node::new(
            position,
            NodeKind::Lambda {
                params,
                body: Rc::new(body),
            },
        )
    }

    pub fn call(position: usize, callee: impl Into<String>, args: Vec<Node>) -> Self {
        Node::new(
            position,
            NodeKind::Call {
                callee: callee.into(),
                args,
            },
        )
    }

    pub fn conditional(condition: Node, then_branch: Node, else_branch: Node) -> Self {
        Node::new(
            condition.position,
            NodeKind::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
        )
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NodeKind::Statements { mode, nodes } => {
                match mode {
                    StatementsMode::Block => write!(f, "(do")?,
                    StatementsMode::Loop => write!(f, "(loop")?,
                }
                for node in nodes {
                    write!(f, " {node}")?;
                }
                write!(f, ")")
            }
            NodeKind::Operation { op, lhs, rhs } => write!(f, "({op} {lhs} {rhs})"),
            NodeKind::Value(value) => write!(f, "{value}"),
            NodeKind::Reference(name) => write!(f, "{name}"),
            NodeKind::Assign { name, value } => write!(f, "(let {name} {value})"),
            NodeKind::Lambda { params, body } => {
                write!(f, "(\\")?;
                for param in params {
                    write!(f, " {param}")?;
                }
                write!(f, " -> {body})")
            }
            NodeKind::Call { callee, args } => {
                write!(f, "(call {callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            NodeKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "(if {condition} {then_branch} {else_branch})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_s_expression() {
        let node = Node::block(
            0,
            vec![
                Node::assign(4, "f", Node::lambda(9, vec!["x".into()], Node::reference(14, "x"))),
                Node::call(
                    17,
                    "f",
                    vec![Node::operation(
                        21,
                        Op::Plus,
                        Node::value(19, 1.0),
                        Node::value(23, 2.0),
                    )],
                ),
            ],
        );
        assert_eq!(node.to_string(), "(do (let f (\\ x -> x)) (call f (+ 1 2)))");
    }

    #[test]
    fn unknown_operator_symbol_is_rejected() {
        assert_eq!(Op::from_symbol(">=", 0), Ok(Op::GreaterEqual));
        let err = Op::from_symbol("->", 5).unwrap_err();
        assert!(matches!(err, LangError::UnknownOperator { .. }));
        assert_eq!(err.position(), 5);
    }
}
