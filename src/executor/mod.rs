use std::collections::HashMap;

use crate::{
    components::{function::Function, ControlFlowOptions, EvaluationException, EvaluationResult},
    trace::ExecutionContext,
    ExecutionError,
};

mod builtins;
pub mod values;

use values::Value;

#[derive(Debug)]
pub struct ExecutorOptions {
    pub max_call_stack_depth: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_call_stack_depth: 64,
        }
    }
}

/// Per-run executor state that is not variable bindings: limits, the output
/// captured from `out(...)`, and the execution trace the tracer primitives
/// record into. Untransformed programs simply never touch the trace.
#[derive(Debug)]
pub struct ExecutorContext {
    pub options: ExecutorOptions,
    pub trace: ExecutionContext,
    pub output: Vec<String>,
}

impl ExecutorContext {
    pub fn new(options: ExecutorOptions) -> Self {
        Self {
            options,
            trace: ExecutionContext::new(),
            output: Vec::new(),
        }
    }
}

impl Default for ExecutorContext {
    fn default() -> Self {
        Self::new(ExecutorOptions::default())
    }
}

/// Variable and function bindings. Scoping is function-level: resolution
/// checks the innermost function scope and then the globals, and assignment
/// binds in the innermost scope, which is how the traced language gets its
/// assignment-declares semantics.
pub struct ExecutorStack {
    functions: HashMap<String, Function>,
    scopes: Vec<ExecutorScope>,
    call_stack: Vec<String>,
}

impl ExecutorStack {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
            scopes: vec![ExecutorScope::new()],
            call_stack: Vec::new(),
        }
    }

    pub fn get_call_stack(&self) -> &Vec<String> {
        &self.call_stack
    }

    pub fn declare_function(
        &mut self,
        function_name: &str,
        function: Function,
    ) -> Result<(), ExecutionError> {
        if self.functions.contains_key(function_name) {
            return Err(format!("Function with name {function_name} already exists").into());
        }
        self.functions.insert(function_name.to_owned(), function);
        return Ok(());
    }

    pub fn has_function(&self, function_name: &str) -> bool {
        self.functions.contains_key(function_name)
    }

    pub fn assign_variable(&mut self, variable_name: &str, value: Value) {
        let scope = self.scopes.last_mut().expect("global scope never pops");
        scope.variables.insert(variable_name.to_owned(), value);
    }

    pub fn resolve_variable(&self, variable_name: &str) -> Result<Value, ExecutionError> {
        let scope = self.scopes.last().expect("global scope never pops");
        if let Some(value) = scope.variables.get(variable_name) {
            return Ok(value.clone());
        }
        if self.scopes.len() > 1 {
            if let Some(value) = self.scopes[0].variables.get(variable_name) {
                return Ok(value.clone());
            }
        }
        return Err(format!("Couldn't find variable with name: {variable_name}.").into());
    }

    pub fn execute_function(
        &mut self,
        function_name: &str,
        positional: Vec<Value>,
        keyword: Vec<(String, Value)>,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        if self.call_stack.len() >= context.options.max_call_stack_depth {
            return Err(format!(
                "Call stack depth limit of {} exceeded",
                context.options.max_call_stack_depth
            ))?;
        }

        self.call_stack.push(function_name.to_owned());
        let result = if let Some(function) = self.functions.get(function_name).cloned() {
            self.call_function(function, positional, keyword, context)?
        } else {
            if !keyword.is_empty() {
                return Err(format!(
                    "No function found with name: '{function_name}' that accepts keyword arguments"
                ))?;
            }
            builtins::call_builtin(function_name, &positional, context)?
        };

        self.call_stack.pop();
        return Ok(result);
    }

    pub fn execute_method(
        &mut self,
        instance: Value,
        method_name: &str,
        arguments: Vec<Value>,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        self.call_stack.push(method_name.to_owned());
        let result = builtins::call_builtin_instance(method_name, &instance, &arguments, context)?;
        self.call_stack.pop();
        return Ok(result);
    }

    fn call_function(
        &mut self,
        function: Function,
        positional: Vec<Value>,
        keyword: Vec<(String, Value)>,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let bindings = bind_arguments(&function, positional, keyword)?;

        self.scopes.push(ExecutorScope::new());
        for (name, value) in bindings {
            self.assign_variable(&name, value);
        }

        let result = function.code.execute(self, context);
        self.scopes.pop();

        return match result {
            Ok(_) => Ok(Value::Null),
            Err(EvaluationException::ControlFlow(ControlFlowOptions::Return(value))) => Ok(value),
            Err(EvaluationException::ControlFlow(ControlFlowOptions::Break())) => {
                Err("Break statement must be used inside a loop".into())
            }
            Err(EvaluationException::ControlFlow(ControlFlowOptions::Continue())) => {
                Err("Continue statement must be used inside a loop".into())
            }
            Err(err) => Err(err),
        };
    }
}

fn bind_arguments(
    function: &Function,
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
) -> Result<Vec<(String, Value)>, ExecutionError> {
    let function_name = &function.name.value;
    if positional.len() > function.parameters.len() {
        return Err(format!(
            "Function {} takes {} arguments, but {} were provided",
            function_name,
            function.parameters.len(),
            positional.len()
        )
        .into());
    }

    let mut bindings: Vec<(String, Option<Value>)> = function
        .parameters
        .iter()
        .map(|parameter| (parameter.value.clone(), None))
        .collect();

    for (binding, value) in bindings.iter_mut().zip(positional) {
        binding.1 = Some(value);
    }

    for (name, value) in keyword {
        let Some(binding) = bindings.iter_mut().find(|(binding, _)| *binding == name) else {
            return Err(format!(
                "Function {function_name} has no parameter named {name}"
            )
            .into());
        };
        if binding.1.is_some() {
            return Err(format!(
                "Function {function_name} got multiple values for parameter {name}"
            )
            .into());
        }
        binding.1 = Some(value);
    }

    return bindings
        .into_iter()
        .map(|(name, value)| {
            let Some(value) = value else {
                return Err(format!(
                    "Function {function_name} is missing a value for parameter {name}"
                )
                .into());
            };
            Ok((name, value))
        })
        .collect();
}

struct ExecutorScope {
    variables: HashMap<String, Value>,
}

impl ExecutorScope {
    fn new() -> Self {
        Self {
            variables: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::components::{block::Block, identifier::Identifier};

    use super::*;

    fn test_function(name: &str, parameters: &[&str]) -> Function {
        Function {
            name: Identifier::from(name),
            parameters: parameters.iter().map(|p| Identifier::from(*p)).collect(),
            code: Block::new(Vec::new()),
            line: 1,
        }
    }

    #[test]
    fn should_resolve_globals_from_function_scopes() {
        let mut stack = ExecutorStack::new();
        stack.assign_variable("global_value", Value::Integer(1));
        stack.scopes.push(ExecutorScope::new());

        assert_eq!(
            stack.resolve_variable("global_value").unwrap(),
            Value::Integer(1)
        );
    }

    #[test]
    fn assignment_should_bind_locally_inside_functions() {
        let mut stack = ExecutorStack::new();
        stack.assign_variable("x", Value::Integer(1));
        stack.scopes.push(ExecutorScope::new());
        stack.assign_variable("x", Value::Integer(2));

        assert_eq!(stack.resolve_variable("x").unwrap(), Value::Integer(2));
        stack.scopes.pop();
        assert_eq!(stack.resolve_variable("x").unwrap(), Value::Integer(1));
    }

    #[test]
    fn should_bind_keyword_arguments_by_name() {
        let function = test_function("f", &["a", "b"]);
        let bindings = bind_arguments(
            &function,
            vec![Value::Integer(1)],
            vec![("b".to_owned(), Value::Integer(2))],
        )
        .unwrap();
        assert_eq!(
            bindings,
            vec![
                ("a".to_owned(), Value::Integer(1)),
                ("b".to_owned(), Value::Integer(2)),
            ]
        );
    }

    #[test]
    fn should_reject_unknown_and_duplicate_keyword_arguments() {
        let function = test_function("f", &["a"]);
        assert!(bind_arguments(
            &function,
            Vec::new(),
            vec![("missing".to_owned(), Value::Integer(1))],
        )
        .is_err());
        assert!(bind_arguments(
            &function,
            vec![Value::Integer(1)],
            vec![("a".to_owned(), Value::Integer(2))],
        )
        .is_err());
    }

    #[test]
    fn should_reject_missing_parameters() {
        let function = test_function("f", &["a", "b"]);
        assert!(bind_arguments(&function, vec![Value::Integer(1)], Vec::new()).is_err());
    }
}
