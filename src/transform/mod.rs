use std::collections::HashSet;

use crate::{
    components::{
        block::Block,
        class::ClassDeclaration,
        expressions::{
            AccessorExpression, BaseExpression, BracketExpression, CallArguments, Expression,
            IndexExpression, ListExpression, MapExpression, TracedCall, VariableExpression,
        },
        function::Function,
        identifier::Identifier,
        program::Program,
        statement::{
            AssignTarget, ForLoop, FrameSpec, IfBranch, IfStatement, Statement, WhileLoop,
        },
    },
    constants::{COND_TEMP, UNKNOWN_CALLEE},
    trace::LoopType,
};

/// Rewrites a parsed program into an equivalent program that reports trace
/// events as it executes. Loops, branches and calls are wrapped in tracked
/// frames; assignments and loop targets are followed by variable snapshots;
/// function bodies get an entry prologue. The output is ordinary AST plus
/// the instrumentation-only nodes the executor interprets against the
/// execution context.
pub struct TracerTransformer {
    class_names: HashSet<String>,
}

impl TracerTransformer {
    pub fn new() -> Self {
        Self {
            class_names: HashSet::new(),
        }
    }

    pub fn transform(mut self, program: Program) -> Program {
        self.class_names = program
            .classes
            .iter()
            .map(|class| class.name.value.clone())
            .collect();

        let statements = program
            .statements
            .iter()
            .flat_map(|statement| self.transform_statement(statement))
            .collect();

        let functions = program
            .functions
            .iter()
            .map(|function| self.transform_function(function))
            .collect();

        let classes = program
            .classes
            .iter()
            .map(|class| ClassDeclaration {
                name: class.name.clone(),
                methods: class
                    .methods
                    .iter()
                    .map(|method| self.transform_function(method))
                    .collect(),
                line: class.line,
            })
            .collect();

        return Program {
            statements,
            functions,
            classes,
        };
    }

    /// The definition itself is not instrumented (the call site is), but the
    /// body is prefixed with the entry prologue that stamps the definition
    /// line and snapshots every parameter.
    fn transform_function(&self, function: &Function) -> Function {
        let mut statements = vec![Statement::TraceFunctionEntry(
            function.line,
            function.parameters.clone(),
        )];
        statements.extend(self.transform_block(&function.code).statements);

        return Function {
            name: function.name.clone(),
            parameters: function.parameters.clone(),
            code: Block::new(statements),
            line: function.line,
        };
    }

    fn transform_block(&self, block: &Block) -> Block {
        Block::new(
            block
                .statements
                .iter()
                .flat_map(|statement| self.transform_statement(statement))
                .collect(),
        )
    }

    fn transform_statement(&self, statement: &Statement) -> Vec<Statement> {
        match statement {
            Statement::Assignment(target, value, line) => {
                let mut statements = vec![Statement::Assignment(
                    target.clone(),
                    self.transform_expression(value),
                    *line,
                )];
                self.append_snapshots(&mut statements, target, *line);
                statements
            }
            Statement::AugAssignment(target, operator, value, line) => {
                let mut statements = vec![Statement::AugAssignment(
                    target.clone(),
                    *operator,
                    self.transform_expression(value),
                    *line,
                )];
                self.append_snapshots(&mut statements, target, *line);
                statements
            }
            Statement::Expression(expression, line) => {
                let mut statements = vec![Statement::Expression(
                    self.transform_expression(expression),
                    *line,
                )];
                // A discarded method call may mutate its receiver, so the
                // receiver's base name is snapshotted after the call.
                if let Some(base) = method_call_base(expression) {
                    if !self.class_names.contains(&base.value) {
                        statements.push(Statement::RecordVariable(
                            base.clone(),
                            base.value.clone(),
                            *line,
                        ));
                    }
                }
                statements
            }
            Statement::If(statement) => {
                self.transform_branches(&statement.branches, &statement.default_block)
            }
            Statement::For(statement) => self.transform_for(statement),
            Statement::While(statement) => self.transform_while(statement),
            Statement::Return(value, line) => vec![Statement::Return(
                value.as_ref().map(|value| self.transform_expression(value)),
                *line,
            )],
            other => vec![other.clone()],
        }
    }

    /// `for t in iter { body }` becomes a loop frame around the whole loop,
    /// an iteration frame per pass, and a snapshot of every name bound by
    /// the loop target at the top of each iteration.
    fn transform_for(&self, statement: &ForLoop) -> Vec<Statement> {
        let mut iteration_body = Vec::new();
        for name in statement.target.names() {
            iteration_body.push(Statement::RecordVariable(
                name.clone(),
                name.value.clone(),
                statement.line,
            ));
        }
        iteration_body.extend(self.transform_block(&statement.body).statements);

        let transformed_loop = Statement::For(ForLoop {
            target: statement.target.clone(),
            iterable: self.transform_expression(&statement.iterable),
            body: Block::new(vec![Statement::Tracked(
                FrameSpec::Iteration,
                Block::new(iteration_body),
            )]),
            line: statement.line,
        });

        return vec![Statement::Tracked(
            FrameSpec::Loop {
                line: statement.line,
                loop_type: LoopType::For,
            },
            Block::new(vec![transformed_loop]),
        )];
    }

    fn transform_while(&self, statement: &WhileLoop) -> Vec<Statement> {
        let transformed_loop = Statement::While(WhileLoop {
            condition: self.transform_expression(&statement.condition),
            body: Block::new(vec![Statement::Tracked(
                FrameSpec::Iteration,
                self.transform_block(&statement.body),
            )]),
            line: statement.line,
        });

        return vec![Statement::Tracked(
            FrameSpec::Loop {
                line: statement.line,
                loop_type: LoopType::While,
            },
            Block::new(vec![transformed_loop]),
        )];
    }

    /// Each level of an `if`/`else if` chain becomes: evaluate the condition
    /// once into a reserved temporary, open a branch frame carrying the
    /// verbatim condition text and the result, and run the matching arm
    /// inside the frame. The rest of the chain nests in the else arm.
    fn transform_branches(
        &self,
        branches: &[IfBranch],
        default_block: &Option<Block>,
    ) -> Vec<Statement> {
        let Some((branch, rest)) = branches.split_first() else {
            return match default_block {
                Some(block) => self.transform_block(block).statements,
                None => Vec::new(),
            };
        };

        let else_statements = self.transform_branches(rest, default_block);
        let condition_str = branch.condition.to_string();
        let temporary: Identifier = COND_TEMP.into();

        let instrumented = IfStatement {
            branches: vec![IfBranch {
                condition: Expression::new(
                    BaseExpression::VariableExpression(VariableExpression {
                        name: temporary.clone(),
                        arguments: None,
                        line: branch.line,
                    }),
                    Vec::new(),
                ),
                block: self.transform_block(&branch.block),
                line: branch.line,
            }],
            default_block: if else_statements.is_empty() {
                None
            } else {
                Some(Block::new(else_statements))
            },
        };

        return vec![
            Statement::Assignment(
                AssignTarget::Simple(temporary.clone()),
                self.transform_expression(&branch.condition),
                branch.line,
            ),
            Statement::Tracked(
                FrameSpec::Branch {
                    line: branch.line,
                    condition_str,
                    condition: temporary,
                },
                Block::new(vec![Statement::If(instrumented)]),
            ),
        ];
    }

    fn append_snapshots(&self, statements: &mut Vec<Statement>, target: &AssignTarget, line: usize) {
        for (name, access_path) in target.bound_names() {
            statements.push(Statement::RecordVariable(name, access_path, line));
        }
    }

    fn transform_expression(&self, expression: &Expression) -> Expression {
        Expression::new(
            self.transform_base(&expression.first),
            expression
                .operations
                .iter()
                .map(|(operator, operand)| (*operator, self.transform_base(operand)))
                .collect(),
        )
    }

    fn transform_base(&self, expression: &BaseExpression) -> BaseExpression {
        match expression {
            BaseExpression::VariableExpression(variable) => {
                let Some(arguments) = &variable.arguments else {
                    return expression.clone();
                };
                let call = VariableExpression {
                    name: variable.name.clone(),
                    arguments: Some(self.transform_arguments(arguments)),
                    line: variable.line,
                };
                BaseExpression::TracedCall(TracedCall {
                    line: variable.line,
                    func_name: variable.name.value.clone(),
                    func_full_name: variable.name.value.clone(),
                    inner: Box::new(BaseExpression::VariableExpression(call)),
                })
            }
            BaseExpression::AccessorExpression(accessor) => {
                let func_full_name = accessor_full_name(accessor);
                let transformed = AccessorExpression {
                    inner: Box::new(self.transform_base(&accessor.inner)),
                    name: accessor.name.clone(),
                    arguments: accessor
                        .arguments
                        .as_ref()
                        .map(|arguments| self.transform_arguments(arguments)),
                    line: accessor.line,
                };
                if transformed.arguments.is_none() {
                    return BaseExpression::AccessorExpression(transformed);
                }
                BaseExpression::TracedCall(TracedCall {
                    line: accessor.line,
                    func_name: accessor.name.value.clone(),
                    func_full_name,
                    inner: Box::new(BaseExpression::AccessorExpression(transformed)),
                })
            }
            BaseExpression::IndexExpression(index) => {
                BaseExpression::IndexExpression(IndexExpression {
                    inner: Box::new(self.transform_base(&index.inner)),
                    index: Box::new(self.transform_expression(&index.index)),
                })
            }
            BaseExpression::ListExpression(list) => BaseExpression::ListExpression(ListExpression {
                values: list
                    .values
                    .iter()
                    .map(|value| self.transform_expression(value))
                    .collect(),
            }),
            BaseExpression::MapExpression(map) => BaseExpression::MapExpression(MapExpression {
                entries: map
                    .entries
                    .iter()
                    .map(|(key, value)| (key.clone(), self.transform_expression(value)))
                    .collect(),
            }),
            BaseExpression::BracketExpression(brackets) => {
                BaseExpression::BracketExpression(BracketExpression {
                    inner: Box::new(self.transform_expression(&brackets.inner)),
                })
            }
            other => other.clone(),
        }
    }

    fn transform_arguments(&self, arguments: &CallArguments) -> CallArguments {
        CallArguments {
            positional: arguments
                .positional
                .iter()
                .map(|argument| self.transform_expression(argument))
                .collect(),
            keyword: arguments
                .keyword
                .iter()
                .map(|(name, argument)| (name.clone(), self.transform_expression(argument)))
                .collect(),
        }
    }
}

impl Default for TracerTransformer {
    fn default() -> Self {
        Self::new()
    }
}

/// The dotted source path of a method callee (`obj.x.f` for `obj.x.f(...)`),
/// or the unknown-callee marker when the receiver chain is not a plain
/// name path.
fn accessor_full_name(accessor: &AccessorExpression) -> String {
    let mut segments = vec![accessor.name.value.clone()];
    let mut current = accessor.inner.as_ref();
    loop {
        match current {
            BaseExpression::VariableExpression(VariableExpression {
                name,
                arguments: None,
                ..
            }) => {
                segments.push(name.value.clone());
                segments.reverse();
                return segments.join(".");
            }
            BaseExpression::AccessorExpression(AccessorExpression {
                inner,
                name,
                arguments: None,
                ..
            }) => {
                segments.push(name.value.clone());
                current = inner.as_ref();
            }
            _ => return UNKNOWN_CALLEE.to_owned(),
        }
    }
}

/// When a bare expression statement is a method call through a name path
/// (`xs.push(1)`, `state.items.clear()`), the base name to snapshot after
/// the call.
fn method_call_base(expression: &Expression) -> Option<&Identifier> {
    if !expression.operations.is_empty() {
        return None;
    }
    let BaseExpression::AccessorExpression(accessor) = &expression.first else {
        return None;
    };
    accessor.arguments.as_ref()?;

    let mut current = accessor.inner.as_ref();
    loop {
        match current {
            BaseExpression::VariableExpression(VariableExpression {
                name,
                arguments: None,
                ..
            }) => return Some(name),
            BaseExpression::AccessorExpression(AccessorExpression {
                inner,
                arguments: None,
                ..
            }) => current = inner.as_ref(),
            BaseExpression::IndexExpression(index) => current = index.inner.as_ref(),
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{lexer::lex, parser};

    use super::*;

    fn transform_source(source: &str) -> Program {
        let tokens = lex(source).collect::<Result<Vec<_>, _>>().unwrap();
        let program = parser::parse(&tokens).unwrap();
        TracerTransformer::new().transform(program)
    }

    #[test]
    fn should_wrap_for_loops_in_loop_and_iteration_frames() {
        let program = transform_source("for i in range(3) {\n  x = i * 2;\n}\n");

        let Statement::Tracked(FrameSpec::Loop { line, loop_type }, block) = &program.statements[0]
        else {
            panic!("expected tracked loop frame");
        };
        assert_eq!(*line, 1);
        assert_eq!(*loop_type, LoopType::For);

        let Statement::For(for_loop) = &block.statements[0] else {
            panic!("expected for loop inside the frame");
        };
        // The iterable call is itself instrumented.
        assert!(matches!(
            for_loop.iterable.first,
            BaseExpression::TracedCall(_)
        ));

        let Statement::Tracked(FrameSpec::Iteration, body) = &for_loop.body.statements[0] else {
            panic!("expected tracked iteration frame");
        };
        // Loop target snapshot comes before the body.
        let Statement::RecordVariable(name, access_path, _) = &body.statements[0] else {
            panic!("expected loop target snapshot");
        };
        assert_eq!(name.value, "i");
        assert_eq!(access_path, "i");
    }

    #[test]
    fn should_desugar_else_if_chains_into_nested_branch_frames() {
        let program =
            transform_source("a = 2;\nif a > 2 {\n  x = 1;\n} else if a > 1 {\n  x = 2;\n}\n");

        let Statement::Assignment(AssignTarget::Simple(temp), _, _) = &program.statements[2] else {
            panic!("expected condition temporary assignment");
        };
        assert_eq!(temp.value, COND_TEMP);

        let Statement::Tracked(
            FrameSpec::Branch {
                line,
                condition_str,
                ..
            },
            block,
        ) = &program.statements[3]
        else {
            panic!("expected tracked branch frame");
        };
        assert_eq!(*line, 2);
        assert_eq!(condition_str, "a > 2");

        let Statement::If(inner) = &block.statements[0] else {
            panic!("expected instrumented if");
        };
        let else_statements = &inner.default_block.as_ref().unwrap().statements;
        let Statement::Tracked(FrameSpec::Branch { condition_str, line, .. }, _) =
            &else_statements[1]
        else {
            panic!("expected nested branch frame");
        };
        assert_eq!(condition_str, "a > 1");
        assert_eq!(*line, 4);
    }

    #[test]
    fn should_record_snapshots_for_assignment_targets() {
        let program = transform_source("m = {\"k\": 0};\nm.k = 2;\n");

        let Statement::RecordVariable(name, access_path, _) = &program.statements[1] else {
            panic!("expected snapshot after assignment");
        };
        assert_eq!(name.value, "m");
        assert_eq!(access_path, "m");

        let Statement::RecordVariable(name, access_path, _) = &program.statements[3] else {
            panic!("expected snapshot after path assignment");
        };
        assert_eq!(name.value, "m");
        assert_eq!(access_path, "m.k");
    }

    #[test]
    fn should_wrap_calls_and_keep_callee_names() {
        let program = transform_source("total = add(1, 2);\n");
        let Statement::Assignment(_, value, _) = &program.statements[0] else {
            panic!("expected assignment");
        };
        let BaseExpression::TracedCall(call) = &value.first else {
            panic!("expected traced call");
        };
        assert_eq!(call.func_name, "add");
        assert_eq!(call.func_full_name, "add");
    }

    #[test]
    fn should_record_receiver_after_bare_method_calls() {
        let program = transform_source("xs = [1];\nxs.push(2);\n");

        let Statement::Expression(expression, _) = &program.statements[2] else {
            panic!("expected expression statement");
        };
        let BaseExpression::TracedCall(call) = &expression.first else {
            panic!("expected traced call");
        };
        assert_eq!(call.func_name, "push");
        assert_eq!(call.func_full_name, "xs.push");

        let Statement::RecordVariable(name, access_path, _) = &program.statements[3] else {
            panic!("expected receiver snapshot");
        };
        assert_eq!(name.value, "xs");
        assert_eq!(access_path, "xs");
    }

    #[test]
    fn should_prefix_function_bodies_with_entry_prologue() {
        let program = transform_source("func f(a, b) {\n  return a + b;\n}\n");
        let Statement::TraceFunctionEntry(line, parameters) = &program.functions[0].code.statements[0]
        else {
            panic!("expected function entry prologue");
        };
        assert_eq!(*line, 1);
        assert_eq!(parameters.len(), 2);
    }

    #[test]
    fn should_instrument_class_methods() {
        let program = transform_source("class Math {\n  func double(x) {\n    return x * 2;\n  }\n}\n");
        let method = &program.classes[0].methods[0];
        assert!(matches!(
            method.code.statements[0],
            Statement::TraceFunctionEntry(_, _)
        ));
    }

    #[test]
    fn should_not_snapshot_class_namespaces_after_method_calls() {
        let program =
            transform_source("class Math {\n  func noop(x) {\n    return x;\n  }\n}\nMath.noop(1);\n");
        let last = program.statements.last().unwrap();
        assert!(
            matches!(last, Statement::Expression(_, _)),
            "no snapshot should follow a class-namespace call"
        );
    }
}
