use std::{
    io::{Stdout, Write, stdout},
    rc::Rc,
};

use crate::{
    Parser,
    ast::{Node, NodeKind, Op, StatementsMode},
    error::{LangError, span},
    memory::Memory,
    value::{Function, Value},
};

/// Tree-walking evaluator. Bindings persist across calls to [`Interpreter::run`].
pub struct Interpreter<W> {
    memory: Memory,
    out: W,
}

impl Interpreter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(stdout())
    }
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Self {
            memory: Memory::new(),
            out,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn run(&mut self, source: &str) -> Result<Value, LangError> {
        let program = Parser::new(source)?.parse()?;
        self.evaluate(&program)
    }

    pub fn evaluate(&mut self, node: &Node) -> Result<Value, LangError> {
        match &node.kind {
            NodeKind::Statements {
                mode: StatementsMode::Block,
                nodes,
            } => nodes
                .iter()
                .map(|node| self.evaluate(node))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Seq),
            NodeKind::Statements {
                mode: StatementsMode::Loop,
                nodes,
            } => {
                let [count, body] = nodes.as_slice() else {
                    return Err(LangError::UnexpectedNode {
                        details: format!(
                            "loop needs a count and a body, found {} children",
                            nodes.len()
                        ),
                        span: span(node.position, 0),
                    });
                };
                let times = match self.evaluate(count)? {
                    Value::Number(n) if n >= 0.0 && n.fract() == 0.0 => n as usize,
                    other => {
                        return Err(LangError::TypeMismatch {
                            op: "loop".to_string(),
                            found: format!("{other} is not a repeat count"),
                            span: span(count.position, 0),
                        });
                    }
                };
                (0..times)
                    .map(|_| self.evaluate(body))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Seq)
            }
            NodeKind::Lambda { params, body } => Ok(Value::Function(Function {
                params: params.clone(),
                body: Rc::clone(body),
            })),
            NodeKind::Assign { name, value } => {
                // The unevaluated node is bound; every reference re-runs it.
                self.memory.assign(name.as_str(), Rc::clone(value));
                if matches!(value.kind, NodeKind::Lambda { .. }) {
                    return Ok(Value::Str("fn".to_string()));
                }
                self.evaluate(value)
            }
            NodeKind::Operation { op, lhs, rhs } => {
                let l = self.evaluate(lhs)?;
                let r = self.evaluate(rhs)?;
                self.operate(node.position, *op, l, r)
            }
            NodeKind::Value(value) => Ok(value.clone()),
            NodeKind::Reference(name) => {
                let bound = self.memory.fetch(name, node.position)?;
                self.evaluate(&bound)
            }
            NodeKind::Call { callee, args } if callee == "print" => self.print(node, args),
            NodeKind::Call { callee, args } => self.call(node.position, callee, args),
            NodeKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
        }
    }

    fn operate(&self, position: usize, op: Op, lhs: Value, rhs: Value) -> Result<Value, LangError> {
        let (l, r) = match (lhs, rhs) {
            (Value::Number(l), Value::Number(r)) => (l, r),
            (Value::Number(_), other) | (other, _) => {
                return Err(LangError::TypeMismatch {
                    op: op.to_string(),
                    found: format!("expected a number, found {} `{other}`", other.type_name()),
                    span: span(position, op.symbol().len()),
                });
            }
        };
        Ok(match op {
            Op::Plus => Value::Number(l + r),
            Op::Minus => Value::Number(l - r),
            Op::Star => Value::Number(l * r),
            Op::Slash => {
                if r == 0.0 {
                    return Err(LangError::DivisionByZero {
                        span: span(position, 1),
                    });
                }
                Value::Number(l / r)
            }
            Op::Greater => Value::Bool(l > r),
            Op::Less => Value::Bool(l < r),
            Op::GreaterEqual => Value::Bool(l >= r),
            Op::LessEqual => Value::Bool(l <= r),
            Op::Equal => Value::Bool(l == r),
            Op::BangEqual => Value::Bool(l != r),
        })
    }

    fn print(&mut self, node: &Node, args: &[Node]) -> Result<Value, LangError> {
        let [arg] = args else {
            return Err(LangError::ArityMismatch {
                name: "print".to_string(),
                expected: 1,
                given: args.len(),
                span: span(node.position, "print".len()),
            });
        };
        let value = self.evaluate(arg)?;
        writeln!(self.out, "{value}").map_err(|e| LangError::Output {
            message: e.to_string(),
            span: span(node.position, "print".len()),
        })?;
        Ok(Value::Str(value.to_string()))
    }

    fn call(&mut self, position: usize, name: &str, args: &[Node]) -> Result<Value, LangError> {
        let callee = self.memory.fetch(name, position)?;
        let function = match self.evaluate(&callee)? {
            Value::Function(function) => function,
            other => {
                return Err(LangError::NotCallable {
                    name: name.to_string(),
                    found: format!("{} `{other}`", other.type_name()),
                    span: span(position, name.len()),
                });
            }
        };
        if function.params.len() != args.len() {
            return Err(LangError::ArityMismatch {
                name: name.to_string(),
                expected: function.params.len(),
                given: args.len(),
                span: span(position, name.len()),
            });
        }

        let actuals = args
            .iter()
            .map(|arg| Ok((arg.position, self.evaluate(arg)?)))
            .collect::<Result<Vec<_>, LangError>>()?;

        self.memory.begin_scope();
        for (param, (position, value)) in function.params.iter().zip(actuals) {
            self.memory
                .assign(param.as_str(), Rc::new(Node::value(position, value)));
        }
        let result = self.evaluate(&function.body);
        self.memory.end_scope();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Result<Value, LangError> {
        Interpreter::new(Vec::new()).run(source)
    }

    fn numbers(values: &[f64]) -> Value {
        Value::Seq(values.iter().copied().map(Value::Number).collect())
    }

    #[test]
    fn arithmetic() {
        assert_eq!(run("1 +   1;"), Ok(numbers(&[2.0])));
        assert_eq!(run("4*4 - 2;"), Ok(numbers(&[14.0])));
        assert_eq!(run("3 + 4 * 2;"), Ok(numbers(&[11.0])));
        assert_eq!(run("(3 + 4) * 2;"), Ok(numbers(&[14.0])));
        assert_eq!(run("7 / 2"), Ok(numbers(&[3.5])));
    }

    #[test]
    fn comparisons_produce_booleans() {
        assert_eq!(
            run("1 < 2; 2 <= 1; 3 = 3; 3 != 3; 4 >= 4; 5 > 6"),
            Ok(Value::Seq(
                [true, false, true, false, true, false]
                    .into_iter()
                    .map(Value::Bool)
                    .collect()
            ))
        );
    }

    #[test]
    fn assignment_yields_value_and_lambda_yields_fn() {
        assert_eq!(
            run("let a := 2; let f := \\ -> a"),
            Ok(Value::Seq(vec![Value::Number(2.0), Value::from("fn")]))
        );
    }

    #[test]
    fn print_writes_a_line_and_returns_text() {
        let mut interpreter = Interpreter::new(Vec::new());
        let result = interpreter.run("print 1 + 2; print 3 > 2").unwrap();
        assert_eq!(
            result,
            Value::Seq(vec![Value::from("3"), Value::from("true")])
        );
        assert_eq!(
            String::from_utf8(interpreter.into_output()).unwrap(),
            "3\ntrue\n"
        );
    }

    #[test]
    fn references_rerun_the_bound_expression() {
        let mut interpreter = Interpreter::new(Vec::new());
        let result = interpreter.run("let a := print 7; a; a").unwrap();
        assert_eq!(result, Value::Seq(vec![Value::from("7"); 3]));
        assert_eq!(
            String::from_utf8(interpreter.into_output()).unwrap(),
            "7\n7\n7\n"
        );
    }

    #[test]
    fn bindings_see_later_rebinding_of_their_inputs() {
        assert_eq!(
            run("let x := 1; let y := x + 1; let x := 5; y"),
            Ok(numbers(&[1.0, 2.0, 5.0, 6.0]))
        );
    }

    #[test]
    fn call_scope_does_not_leak() {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter
            .run("let x := 10; let f := \\x -> { let y := x; y }; f 3")
            .unwrap();
        assert_eq!(interpreter.memory().depth(), 0);
        assert!(matches!(
            interpreter.run("y"),
            Err(LangError::UnboundVariable { .. })
        ));
        assert_eq!(interpreter.run("x"), Ok(numbers(&[10.0])));
    }

    #[test]
    fn arguments_are_evaluated_in_the_callers_scope() {
        assert_eq!(
            run("let x := 10; let f := \\x y -> x - y; f 3 x"),
            Ok(Value::Seq(vec![
                Value::Number(10.0),
                Value::from("fn"),
                Value::Number(-7.0),
            ]))
        );
    }

    #[test]
    fn functions_recurse_through_their_own_binding() {
        let source = "let fact := \\n -> if n < 2 then 1 else n * fact (n - 1); fact 5";
        let Ok(Value::Seq(values)) = run(source) else {
            panic!("program failed");
        };
        assert_eq!(values[1], Value::Number(120.0));
    }

    #[test]
    fn functions_are_values() {
        let source = "let apply := \\g v -> g v; let inc := \\n -> n + 1; apply (inc) 4";
        let Ok(Value::Seq(values)) = run(source) else {
            panic!("program failed");
        };
        assert_eq!(values[2], Value::Number(5.0));
    }

    #[test]
    fn arity_mismatch_skips_body_and_arguments() {
        let mut interpreter = Interpreter::new(Vec::new());
        let err = interpreter
            .run("let f := \\x y -> print x; f (print 1)")
            .unwrap_err();
        assert_eq!(
            err,
            LangError::ArityMismatch {
                name: "f".into(),
                expected: 2,
                given: 1,
                span: span(26, 1),
            }
        );
        assert!(interpreter.output().is_empty());
        assert_eq!(interpreter.memory().depth(), 0);
    }

    #[test]
    fn unbound_reference_reports_its_position() {
        let err = run("let a := 1;\nb + a").unwrap_err();
        assert_eq!(
            err,
            LangError::UnboundVariable {
                name: "b".into(),
                span: span(12, 1),
            }
        );
    }

    #[test]
    fn only_the_selected_branch_runs() {
        assert_eq!(run("if 1 > 2 then (1/0) else 3"), Ok(numbers(&[3.0])));
        assert_eq!(run("if 0 then 1 else 2"), Ok(numbers(&[2.0])));
        assert!(matches!(
            run("if 2 > 1 then (1/0) else 3"),
            Err(LangError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn non_numeric_operand_is_a_type_mismatch() {
        let err = run("(1 < 2) + 1").unwrap_err();
        assert!(matches!(err, LangError::TypeMismatch { .. }));
        assert_eq!(err.position(), 8);
    }

    #[test]
    fn calling_a_number_is_rejected() {
        assert!(matches!(
            run("let n := 1; n 2"),
            Err(LangError::NotCallable { .. })
        ));
    }

    #[test]
    fn error_inside_call_restores_scope() {
        let mut interpreter = Interpreter::new(Vec::new());
        assert!(interpreter.run("let f := \\x -> x / 0; f 1").is_err());
        assert_eq!(interpreter.memory().depth(), 0);
    }

    #[test]
    fn loop_repeats_its_body() {
        let mut interpreter = Interpreter::new(Vec::new());
        let program = Node::repeat(
            0,
            Node::value(0, 3.0),
            Node::call(0, "print", vec![Node::value(0, 7.0)]),
        );
        assert_eq!(
            interpreter.evaluate(&program),
            Ok(Value::Seq(vec![Value::from("7"); 3]))
        );
        assert_eq!(
            String::from_utf8(interpreter.into_output()).unwrap(),
            "7\n7\n7\n"
        );
    }

    #[test]
    fn loop_count_must_be_a_whole_number() {
        let mut interpreter = Interpreter::new(Vec::new());
        let program = Node::repeat(0, Node::value(0, 1.5), Node::value(0, 1.0));
        assert!(matches!(
            interpreter.evaluate(&program),
            Err(LangError::TypeMismatch { .. })
        ));

        let malformed = Node::new(
            0,
            NodeKind::Statements {
                mode: StatementsMode::Loop,
                nodes: vec![Node::value(0, 1.0)],
            },
        );
        assert!(matches!(
            interpreter.evaluate(&malformed),
            Err(LangError::UnexpectedNode { .. })
        ));
    }

    #[test]
    fn print_takes_exactly_one_argument() {
        let mut interpreter = Interpreter::new(Vec::new());
        let program = Node::call(0, "print", vec![Node::value(0, 1.0), Node::value(0, 2.0)]);
        assert!(matches!(
            interpreter.evaluate(&program),
            Err(LangError::ArityMismatch { given: 2, .. })
        ));
    }
}
