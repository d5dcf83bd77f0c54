use crate::{
    components::{
        expressions::{
            BaseExpression, BooleanLiteral, CallArguments, Expression, IntegerLiteral,
            ListExpression, MapExpression, NullLiteral, StringLiteral, VariableExpression,
        },
        program::Program,
        statement::Statement,
    },
    errors::EngineError,
    executor::{ExecutorContext, ExecutorOptions, ExecutorStack},
    lexer,
    parser,
    transform::TracerTransformer,
};

/// Drives one traced run: parse the source, rewrite it with the tracer
/// transformer, and execute the rewritten program under an executor whose
/// context records the trace.
pub struct StepTracer {
    options: ExecutorOptions,
}

impl StepTracer {
    pub fn new() -> Self {
        Self {
            options: ExecutorOptions::default(),
        }
    }

    pub fn parse(&self, source: &str) -> Result<Program, EngineError> {
        let tokens = lexer::lex(source).collect::<Result<Vec<_>, _>>()?;
        return Ok(parser::parse(&tokens)?);
    }

    pub fn transform(&self, program: Program) -> Program {
        TracerTransformer::new().transform(program)
    }

    pub fn execute_transformed(&self, program: &Program) -> Result<ExecutorContext, EngineError> {
        let mut context = ExecutorContext::new(ExecutorOptions {
            max_call_stack_depth: self.options.max_call_stack_depth,
        });
        let mut stack = ExecutorStack::new();
        program.execute(&mut stack, &mut context)?;
        return Ok(context);
    }

    /// Parse, transform and execute `source`, returning the executor context
    /// with the recorded trace.
    pub fn trace(&self, source: &str) -> Result<ExecutorContext, EngineError> {
        let program = self.parse(source)?;
        let program = self.transform(program);
        return self.execute_transformed(&program);
    }

    /// As `trace`, but first appends a call to `entry_function` with
    /// `test_data` bound as keyword arguments, so the entry call itself is
    /// instrumented like any other call in the program.
    pub fn trace_with_input(
        &self,
        source: &str,
        entry_function: &str,
        test_data: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<ExecutorContext, EngineError> {
        let mut program = self.parse(source)?;
        append_entry_call(&mut program, entry_function, test_data, entry_line(source))?;
        let program = self.transform(program);
        return self.execute_transformed(&program);
    }
}

impl Default for StepTracer {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_line(source: &str) -> usize {
    source.lines().count() + 1
}

fn append_entry_call(
    program: &mut Program,
    entry_function: &str,
    test_data: &serde_json::Map<String, serde_json::Value>,
    line: usize,
) -> Result<(), EngineError> {
    let mut keyword = Vec::new();
    for (name, value) in test_data {
        keyword.push((name.as_str().into(), json_to_expression(value, line)?));
    }

    let call = VariableExpression {
        name: entry_function.into(),
        arguments: Some(CallArguments {
            positional: Vec::new(),
            keyword,
        }),
        line,
    };

    program.statements.push(Statement::Expression(
        Expression::new(BaseExpression::VariableExpression(call), Vec::new()),
        line,
    ));
    return Ok(());
}

/// Builds a literal expression from a JSON value, so test data can be spliced
/// into the program as ordinary source-level literals.
fn json_to_expression(value: &serde_json::Value, line: usize) -> Result<Expression, EngineError> {
    let base = match value {
        serde_json::Value::Null => BaseExpression::NullLiteral(NullLiteral {}),
        serde_json::Value::Bool(value) => {
            BaseExpression::BooleanLiteral(BooleanLiteral { value: *value })
        }
        serde_json::Value::Number(number) => {
            let Some(value) = number.as_i64() else {
                return Err(EngineError::Other(format!(
                    "Unsupported number in test data: {number}"
                )));
            };
            BaseExpression::IntegerLiteral(IntegerLiteral { value })
        }
        serde_json::Value::String(value) => {
            BaseExpression::StringLiteral(StringLiteral::new(value))
        }
        serde_json::Value::Array(values) => BaseExpression::ListExpression(ListExpression {
            values: values
                .iter()
                .map(|value| json_to_expression(value, line))
                .collect::<Result<Vec<_>, _>>()?,
        }),
        serde_json::Value::Object(entries) => BaseExpression::MapExpression(MapExpression {
            entries: entries
                .iter()
                .map(|(key, value)| Ok((StringLiteral::new(key), json_to_expression(value, line)?)))
                .collect::<Result<Vec<_>, EngineError>>()?,
        }),
    };
    return Ok(Expression::new(base, Vec::new()));
}
