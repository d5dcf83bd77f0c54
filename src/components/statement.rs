use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::{ControlFlowOptions, EvaluationException, EvaluationResult, Tokens},
    constants::{BREAK, CONTINUE, ELSE, FOR, IF, IN, RETURN, WHILE},
    executor::{values::Value, ExecutorContext, ExecutorStack},
    lexer::{Token, TokenValue},
    trace::LoopType,
    utils::{formatting::fmt_collection, iterators::Backtrackable},
    ParserError,
};

use super::{block::Block, expressions::Expression, identifier::Identifier, operator::Operator};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Assignment(AssignTarget, Expression, usize),
    AugAssignment(AssignTarget, Operator, Expression, usize),
    Expression(Expression, usize),
    If(IfStatement),
    For(ForLoop),
    While(WhileLoop),
    Return(Option<Expression>, usize),
    Break(usize),
    Continue(usize),

    // The variants below are never produced by the parser; the tracer
    // transformer emits them when instrumenting a program.
    Tracked(FrameSpec, Block),
    RecordVariable(Identifier, String, usize),
    TraceFunctionEntry(usize, Vec<Identifier>),
}

/// Describes the trace frame a `Tracked` block opens around its body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FrameSpec {
    Loop {
        line: usize,
        loop_type: LoopType,
    },
    Iteration,
    Branch {
        line: usize,
        condition_str: String,
        condition: Identifier,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStatement {
    pub branches: Vec<IfBranch>,
    pub default_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBranch {
    pub condition: Expression,
    pub block: Block,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForLoop {
    pub target: LoopTarget,
    pub iterable: Expression,
    pub body: Block,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LoopTarget {
    Single(Identifier),
    Unpack(Vec<Identifier>),
}

impl LoopTarget {
    pub fn names(&self) -> Vec<&Identifier> {
        match self {
            LoopTarget::Single(name) => vec![name],
            LoopTarget::Unpack(names) => names.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileLoop {
    pub condition: Expression,
    pub body: Block,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AssignTarget {
    Simple(Identifier),
    Unpack(Vec<Identifier>),
    Path(PathTarget),
}

/// An attribute or subscript target such as `m.key` or `xs[i + 1]`. Only the
/// base name is a variable; the segments step into its containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathTarget {
    pub base: Identifier,
    pub segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PathSegment {
    Attribute(Identifier),
    Index(Expression),
}

impl AssignTarget {
    /// The names bound by this target together with their access paths, the
    /// way the tracer records them: every unpacked name, or the base name of
    /// an attribute/subscript target with the full syntactic path.
    pub fn bound_names(&self) -> Vec<(Identifier, String)> {
        match self {
            AssignTarget::Simple(name) => vec![(name.clone(), name.value.clone())],
            AssignTarget::Unpack(names) => names
                .iter()
                .map(|name| (name.clone(), name.value.clone()))
                .collect(),
            AssignTarget::Path(path) => vec![(path.base.clone(), path.to_string())],
        }
    }

    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Option<(AssignTarget, Option<Operator>)> {
        tokens.backtrack_if_none(Self::parse_impl)
    }

    fn parse_impl<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Option<(AssignTarget, Option<Operator>)> {
        if let Some(TokenValue::LeftSquare()) = tokens.peek_value() {
            tokens.next();
            let mut names = Vec::new();
            loop {
                let Some(TokenValue::Identifier(name)) = tokens.next_value() else {
                    return None;
                };
                names.push((*name).into());
                match tokens.next_value() {
                    Some(TokenValue::Comma()) => {}
                    Some(TokenValue::RightSquare()) => break,
                    _ => return None,
                }
            }
            return if Self::parse_plain_equals(tokens) {
                Some((AssignTarget::Unpack(names), None))
            } else {
                None
            };
        }

        let Some(TokenValue::Identifier(name)) = tokens.next_value() else {
            return None;
        };
        let base: Identifier = (*name).into();

        let mut segments = Vec::new();
        loop {
            match tokens.peek_value() {
                Some(TokenValue::Dot()) => {
                    tokens.next();
                    let Some(TokenValue::Identifier(attribute)) = tokens.next_value() else {
                        return None;
                    };
                    segments.push(PathSegment::Attribute((*attribute).into()));
                }
                Some(TokenValue::LeftSquare()) => {
                    tokens.next();
                    let Ok(index) = Expression::parse(tokens) else {
                        return None;
                    };
                    let Some(TokenValue::RightSquare()) = tokens.next_value() else {
                        return None;
                    };
                    segments.push(PathSegment::Index(index));
                }
                _ => break,
            }
        }

        let target = if segments.is_empty() {
            AssignTarget::Simple(base)
        } else {
            AssignTarget::Path(PathTarget { base, segments })
        };

        if let Some(operator) = Operator::try_parse_augmented(tokens) {
            return Some((target, Some(operator)));
        }

        if Self::parse_plain_equals(tokens) {
            return Some((target, None));
        }

        return None;
    }

    // A single `=`, rejecting the first half of `==`. Consumes the `=` only
    // when it matches.
    fn parse_plain_equals<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> bool {
        let Some(TokenValue::Equals()) = tokens.peek_value() else {
            return false;
        };
        if let Some(Token {
            value: TokenValue::Equals(),
            ..
        }) = tokens.peek_ahead(1)
        {
            return false;
        }
        tokens.next();
        return true;
    }
}

impl Display for PathTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.base.fmt(f)?;
        for segment in &self.segments {
            match segment {
                PathSegment::Attribute(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        return Ok(());
    }
}

impl Display for AssignTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignTarget::Simple(name) => name.fmt(f),
            AssignTarget::Unpack(names) => fmt_collection("[", ", ", "]", names.iter(), f),
            AssignTarget::Path(path) => path.fmt(f),
        }
    }
}

impl Statement {
    pub fn parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Statement, ParserError> {
        match tokens.peek_value() {
            Some(TokenValue::Keyword(IF)) => return Ok(Statement::If(IfStatement::parse(tokens)?)),
            Some(TokenValue::Keyword(FOR)) => return Ok(Statement::For(ForLoop::parse(tokens)?)),
            Some(TokenValue::Keyword(WHILE)) => {
                return Ok(Statement::While(WhileLoop::parse(tokens)?))
            }
            _ => {}
        }

        let statement = Self::parse_simple(tokens)?;
        let Some(TokenValue::Semicolon()) = tokens.peek_value() else {
            return Err("statement must end with ;".into());
        };
        tokens.next();
        return Ok(statement);
    }

    fn parse_simple<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Statement, ParserError> {
        let line = tokens.peek_line();
        let next = tokens.peek_value();

        if let Some(TokenValue::Keyword(RETURN)) = next {
            tokens.next();
            if let Some(TokenValue::Semicolon()) = tokens.peek_value() {
                return Ok(Statement::Return(None, line));
            }
            return Ok(Statement::Return(Some(Expression::parse(tokens)?), line));
        };

        if let Some(TokenValue::Keyword(BREAK)) = next {
            tokens.next();
            return Ok(Statement::Break(line));
        };

        if let Some(TokenValue::Keyword(CONTINUE)) = next {
            tokens.next();
            return Ok(Statement::Continue(line));
        };

        if let Some((target, operator)) = AssignTarget::try_parse(tokens) {
            let value = Expression::parse(tokens)?;
            return Ok(match operator {
                Some(operator) => Statement::AugAssignment(target, operator, value, line),
                None => Statement::Assignment(target, value, line),
            });
        }

        // Otherwise it might be a bare expression
        let expression = Expression::parse(tokens)?;
        return Ok(Statement::Expression(expression, line));
    }

    pub fn execute(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        match self {
            Statement::Assignment(target, expression, _) => {
                let value = expression.evaluate(stack, context)?;
                assign_to_target(target, value, stack, context)?;
            }
            Statement::AugAssignment(target, operator, expression, _) => {
                let right = expression.evaluate(stack, context)?;
                let current = read_target(target, stack, context)?;
                let value = operator.execute(current, right)?;
                assign_to_target(target, value, stack, context)?;
            }
            Statement::Expression(expression, _) => {
                expression.evaluate(stack, context)?;
            }
            Statement::If(statement) => return statement.execute(stack, context),
            Statement::For(statement) => return statement.execute(stack, context),
            Statement::While(statement) => return statement.execute(stack, context),
            Statement::Return(expression, _) => {
                let value = match expression {
                    Some(expression) => expression.evaluate(stack, context)?,
                    None => Value::Null,
                };
                return Err(ControlFlowOptions::Return(value).into());
            }
            Statement::Break(_) => return Err(ControlFlowOptions::Break().into()),
            Statement::Continue(_) => return Err(ControlFlowOptions::Continue().into()),
            Statement::Tracked(frame, block) => return execute_tracked(frame, block, stack, context),
            Statement::RecordVariable(name, access_path, line) => {
                let value = stack.resolve_variable(&name.value)?;
                context
                    .trace
                    .record_variable(&name.value, value.deep_copy(), access_path, *line);
            }
            Statement::TraceFunctionEntry(line, parameters) => {
                execute_trace_function_entry(*line, parameters, stack, context)?;
            }
        };

        return Ok(Value::Null);
    }
}

impl IfStatement {
    fn parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Self, ParserError> {
        let line = tokens.peek_line();
        let Some(TokenValue::Keyword(IF)) = tokens.next_value() else {
            return Err("branch must start with if".into());
        };

        let mut branches = Vec::new();
        let mut default_block = None;
        let mut next_line = line;

        loop {
            let condition = Expression::parse(tokens)?;
            let block = Block::parse(tokens)?;
            branches.push(IfBranch {
                condition,
                block,
                line: next_line,
            });

            let Some(TokenValue::Keyword(ELSE)) = tokens.peek_value() else {
                break;
            };
            tokens.next();

            next_line = tokens.peek_line();
            if let Some(TokenValue::Keyword(IF)) = tokens.peek_value() {
                tokens.next();
            } else {
                default_block = Some(Block::parse(tokens)?);
                break;
            }
        }

        return Ok(Self {
            branches,
            default_block,
        });
    }

    fn execute(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        for branch in &self.branches {
            let condition = branch.condition.evaluate(stack, context)?;
            let Value::Boolean(condition) = condition else {
                return Err("If statement condition must evaluate to a boolean".into());
            };
            if condition {
                return branch.block.execute(stack, context);
            }
        }

        if let Some(default_block) = &self.default_block {
            return default_block.execute(stack, context);
        }
        return Ok(Value::Null);
    }
}

impl ForLoop {
    fn parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Self, ParserError> {
        let line = tokens.peek_line();
        let Some(TokenValue::Keyword(FOR)) = tokens.next_value() else {
            return Err("loop must start with for".into());
        };

        let target = match tokens.next_value() {
            Some(TokenValue::Identifier(name)) => LoopTarget::Single((*name).into()),
            Some(TokenValue::LeftSquare()) => {
                let mut names = Vec::new();
                loop {
                    let Some(TokenValue::Identifier(name)) = tokens.next_value() else {
                        return Err("expected identifier in loop target".into());
                    };
                    names.push((*name).into());
                    match tokens.next_value() {
                        Some(TokenValue::Comma()) => {}
                        Some(TokenValue::RightSquare()) => break,
                        _ => return Err("expected , or ] in loop target".into()),
                    }
                }
                LoopTarget::Unpack(names)
            }
            _ => return Err("expected identifier after for".into()),
        };

        let Some(TokenValue::Keyword(IN)) = tokens.next_value() else {
            return Err("expected keyword in".into());
        };

        let iterable = Expression::parse(tokens)?;
        let body = Block::parse(tokens)?;

        return Ok(Self {
            target,
            iterable,
            body,
            line,
        });
    }

    fn execute(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let Value::List(items) = self.iterable.evaluate(stack, context)? else {
            return Err("for ... in loop must be used on a list value".into());
        };

        // Iterate over a snapshot so body mutations of the list cannot
        // invalidate the traversal mid-loop.
        let items = items.borrow().clone();
        for item in items {
            bind_loop_target(&self.target, item, stack)?;

            let result = self.body.execute(stack, context);
            if let Err(EvaluationException::ControlFlow(ControlFlowOptions::Break())) = result {
                break;
            }
            if let Err(EvaluationException::ControlFlow(ControlFlowOptions::Continue())) = result {
                continue;
            }
            result?;
        }

        return Ok(Value::Null);
    }
}

impl WhileLoop {
    fn parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Self, ParserError> {
        let line = tokens.peek_line();
        let Some(TokenValue::Keyword(WHILE)) = tokens.next_value() else {
            return Err("loop must start with while".into());
        };

        let condition = Expression::parse(tokens)?;
        let body = Block::parse(tokens)?;

        return Ok(Self {
            condition,
            body,
            line,
        });
    }

    fn execute(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        loop {
            let Value::Boolean(condition) = self.condition.evaluate(stack, context)? else {
                return Err("while loop condition must evaluate to a boolean value".into());
            };

            if !condition {
                return Ok(Value::Null);
            }

            let result = self.body.execute(stack, context);
            if let Err(EvaluationException::ControlFlow(ControlFlowOptions::Break())) = result {
                return Ok(Value::Null);
            }
            if let Err(EvaluationException::ControlFlow(ControlFlowOptions::Continue())) = result {
                continue;
            }
            result?;
        }
    }
}

fn bind_loop_target(
    target: &LoopTarget,
    item: Value,
    stack: &mut ExecutorStack,
) -> EvaluationResult<()> {
    match target {
        LoopTarget::Single(name) => {
            stack.assign_variable(&name.value, item);
        }
        LoopTarget::Unpack(names) => {
            let Value::List(values) = item else {
                return Err("Cannot unpack a non-list value in a loop target".into());
            };
            let values = values.borrow();
            if values.len() != names.len() {
                return Err(format!(
                    "Cannot unpack {} values into {} names",
                    values.len(),
                    names.len()
                ))?;
            }
            for (name, value) in names.iter().zip(values.iter()) {
                stack.assign_variable(&name.value, value.clone());
            }
        }
    }
    return Ok(());
}

fn assign_to_target(
    target: &AssignTarget,
    value: Value,
    stack: &mut ExecutorStack,
    context: &mut ExecutorContext,
) -> EvaluationResult<()> {
    match target {
        AssignTarget::Simple(name) => {
            stack.assign_variable(&name.value, value);
        }
        AssignTarget::Unpack(names) => {
            let Value::List(values) = value else {
                return Err("Cannot use an unpacking assignment with a non-list value".into());
            };
            let values = values.borrow();
            if values.len() != names.len() {
                return Err(format!(
                    "Cannot unpack {} values into {} names",
                    values.len(),
                    names.len()
                ))?;
            }
            for (name, value) in names.iter().zip(values.iter()) {
                stack.assign_variable(&name.value, value.clone());
            }
        }
        AssignTarget::Path(path) => {
            let (last, rest) = path.segments.split_last().expect("path has segments");
            let mut container = stack.resolve_variable(&path.base.value)?;
            for segment in rest {
                container = step_into(&container, segment, stack, context)?;
            }
            match last {
                PathSegment::Attribute(name) => container.set_entry(&name.value, value)?,
                PathSegment::Index(index) => {
                    let index = index.evaluate(stack, context)?;
                    match (&container, &index) {
                        (Value::List(values), Value::Integer(position)) => {
                            let mut values = values.borrow_mut();
                            let position = usize::try_from(*position)
                                .map_err(|_| "Index must be a non-negative integer")?;
                            if position >= values.len() {
                                return Err(format!(
                                    "Index value must be less than list length, list has length {} and got index {}.",
                                    values.len(),
                                    position
                                ))?;
                            }
                            values[position] = value;
                        }
                        (Value::Map(_), Value::String(key)) => container.set_entry(key, value)?,
                        (container, index) => {
                            return Err(format!(
                                "Cannot index a value of type {} with a value of type {}",
                                container.type_name(),
                                index.type_name()
                            ))?
                        }
                    }
                }
            }
        }
    }
    return Ok(());
}

fn read_target(
    target: &AssignTarget,
    stack: &mut ExecutorStack,
    context: &mut ExecutorContext,
) -> EvaluationResult<Value> {
    match target {
        AssignTarget::Simple(name) => Ok(stack.resolve_variable(&name.value)?),
        AssignTarget::Unpack(_) => {
            Err("Augmented assignment is not supported for unpacking targets".into())
        }
        AssignTarget::Path(path) => {
            let mut current = stack.resolve_variable(&path.base.value)?;
            for segment in &path.segments {
                current = step_into(&current, segment, stack, context)?;
            }
            Ok(current)
        }
    }
}

fn step_into(
    container: &Value,
    segment: &PathSegment,
    stack: &mut ExecutorStack,
    context: &mut ExecutorContext,
) -> EvaluationResult<Value> {
    match segment {
        PathSegment::Attribute(name) => {
            Ok(container.get_entry(&name.value).ok_or::<String>(format!(
                "No entry named {} on value of type {}",
                name.value,
                container.type_name()
            ))?)
        }
        PathSegment::Index(index) => {
            let index = index.evaluate(stack, context)?;
            match (container, &index) {
                (Value::List(values), Value::Integer(position)) => {
                    let values = values.borrow();
                    let position = usize::try_from(*position)
                        .map_err(|_| "Index must be a non-negative integer")?;
                    Ok(values
                        .get(position)
                        .ok_or(format!(
                            "Index value must be less than list length, list has length {} and got index {}.",
                            values.len(),
                            position
                        ))?
                        .clone())
                }
                (Value::Map(_), Value::String(key)) => Ok(container
                    .get_entry(key)
                    .ok_or::<String>(format!("No entry named {key} in map"))?),
                (container, index) => Err(format!(
                    "Cannot index a value of type {} with a value of type {}",
                    container.type_name(),
                    index.type_name()
                ))?,
            }
        }
    }
}

fn execute_tracked(
    frame: &FrameSpec,
    block: &Block,
    stack: &mut ExecutorStack,
    context: &mut ExecutorContext,
) -> EvaluationResult<Value> {
    let record = match frame {
        FrameSpec::Loop { line, loop_type } => {
            context.trace.create_loop_execution(*line, *loop_type)
        }
        FrameSpec::Iteration => context
            .trace
            .create_loop_iteration()
            .map_err(EvaluationException::from)?,
        FrameSpec::Branch {
            line,
            condition_str,
            condition,
        } => {
            let Value::Boolean(result) = stack.resolve_variable(&condition.value)? else {
                return Err("Branch condition must evaluate to a boolean".into());
            };
            context
                .trace
                .create_branch_execution(*line, condition_str, result)
        }
    };

    context.trace.push_execution(record);
    let result = block.execute(stack, context);
    // Popping before the result propagates keeps the frame stack balanced on
    // errors and on return/break/continue unwinds.
    context
        .trace
        .pop_execution()
        .map_err(EvaluationException::from)?;
    return result;
}

fn execute_trace_function_entry(
    line: usize,
    parameters: &[Identifier],
    stack: &mut ExecutorStack,
    context: &mut ExecutorContext,
) -> EvaluationResult<()> {
    let Some(frame) = context.trace.current_execution().cloned() else {
        return Err(EvaluationException::Trace(
            "No active function call to record an entry for.".into(),
        ));
    };
    frame
        .borrow_mut()
        .set_func_def_line_num(line)
        .map_err(EvaluationException::from)?;

    for parameter in parameters {
        let value = stack.resolve_variable(&parameter.value)?;
        context
            .trace
            .record_variable(&parameter.value, value.deep_copy(), &parameter.value, line);
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_statement(source: &str) -> Statement {
        let tokens = lex(source).collect::<Result<Vec<_>, _>>().unwrap();
        let mut tokens = Backtrackable::new(tokens.iter());
        Statement::parse(&mut tokens).unwrap()
    }

    #[test]
    fn should_parse_simple_assignment() {
        let Statement::Assignment(AssignTarget::Simple(name), _, line) =
            parse_statement("x = 1 + 2;")
        else {
            panic!("expected assignment");
        };
        assert_eq!(name.value, "x");
        assert_eq!(line, 1);
    }

    #[test]
    fn should_parse_augmented_assignment() {
        let Statement::AugAssignment(AssignTarget::Simple(name), operator, _, _) =
            parse_statement("sum += num;")
        else {
            panic!("expected augmented assignment");
        };
        assert_eq!(name.value, "sum");
        assert_eq!(operator, Operator::Addition);
    }

    #[test]
    fn should_parse_path_assignment_with_access_path() {
        let Statement::Assignment(target @ AssignTarget::Path(_), _, _) =
            parse_statement("m.counts[i] = 4;")
        else {
            panic!("expected path assignment");
        };
        assert_eq!(target.to_string(), "m.counts[i]");
        assert_eq!(target.bound_names()[0].0.value, "m");
    }

    #[test]
    fn should_parse_unpacking_assignment() {
        let Statement::Assignment(AssignTarget::Unpack(names), _, _) =
            parse_statement("[a, b] = pair;")
        else {
            panic!("expected unpacking assignment");
        };
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn should_not_mistake_equality_for_assignment() {
        let Statement::Expression(expression, _) = parse_statement("x == 1;") else {
            panic!("expected expression statement");
        };
        assert_eq!(expression.to_string(), "x == 1");
    }

    #[test]
    fn should_parse_else_if_chain_with_branch_lines() {
        let source = "if a > 1 {\n  x = 1;\n} else if a > 0 {\n  x = 2;\n} else {\n  x = 3;\n}";
        let Statement::If(statement) = parse_statement(source) else {
            panic!("expected if statement");
        };
        assert_eq!(statement.branches.len(), 2);
        assert_eq!(statement.branches[0].line, 1);
        assert_eq!(statement.branches[1].line, 3);
        assert!(statement.default_block.is_some());
        assert_eq!(statement.branches[1].condition.to_string(), "a > 0");
    }

    #[test]
    fn should_parse_for_loop_with_unpack_target() {
        let Statement::For(statement) = parse_statement("for [k, v] in pairs {\n  out(k);\n}")
        else {
            panic!("expected for loop");
        };
        let LoopTarget::Unpack(names) = &statement.target else {
            panic!("expected unpack target");
        };
        assert_eq!(names.len(), 2);
        assert_eq!(statement.iterable.to_string(), "pairs");
    }
}
