use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::{identifier::Identifier, EvaluationResult, Tokens},
    executor::{values::Value, ExecutorContext, ExecutorStack},
    lexer::{Token, TokenValue},
    trace::StmtRef,
    utils::iterators::Backtrackable,
    ParserError,
};

use super::{
    variable::{CallArguments, VariableExpression},
    BaseExpression, DependentExpressionComponent,
};

/// Dotted access on a value: a map entry read (`m.key`), a method call
/// (`xs.push(v)`), or a call into a class namespace (`Point.make(...)`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessorExpression {
    pub inner: Box<BaseExpression>,
    pub name: Identifier,
    pub arguments: Option<CallArguments>,
    pub line: usize,
}

impl DependentExpressionComponent for AccessorExpression {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        inner: BaseExpression,
        tokens: &mut Backtrackable<I>,
    ) -> Result<Result<Self, BaseExpression>, ParserError> {
        let Some(TokenValue::Dot()) = tokens.peek_value() else {
            return Ok(Err(inner));
        };
        let line = tokens.peek_line();
        tokens.next();

        let Some(name) = Identifier::try_parse(tokens)? else {
            return Err("Expected identifier after .".into());
        };

        let mut arguments = None;
        if let Some(TokenValue::LeftBracket()) = tokens.peek_value() {
            tokens.next();
            arguments = Some(CallArguments::parse(tokens)?);
        }

        return Ok(Ok(AccessorExpression {
            inner: Box::new(inner),
            name,
            arguments,
            line,
        }));
    }

    fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        if self.arguments.is_some() {
            return self.evaluate_call(None, stack, context);
        }

        let instance = self.inner.evaluate(stack, context)?;
        return Ok(instance.get_entry(&self.name.value).ok_or::<String>(format!(
            "No entry named {} on value of type {}",
            self.name.value,
            instance.type_name()
        ))?);
    }
}

impl AccessorExpression {
    /// Dispatches the call: through the class namespace when the receiver is
    /// a bare name that names a class, otherwise as an instance method on
    /// the evaluated receiver. A traced call passes its frame so arguments
    /// are recorded as they are evaluated; the untraced path passes none
    /// and gets identical dispatch.
    pub(super) fn evaluate_call(
        &self,
        frame: Option<&StmtRef>,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let Some(arguments) = &self.arguments else {
            return Err(format!("{} is not a call expression", self.name.value))?;
        };

        if let Some(function_name) = self.class_function_name(stack) {
            let (positional, keyword) = arguments.evaluate(frame, stack, context)?;
            return stack.execute_function(&function_name, positional, keyword, context);
        }

        let instance = self.inner.evaluate(stack, context)?;
        let (positional, keyword) = arguments.evaluate(frame, stack, context)?;
        if !keyword.is_empty() {
            return Err(format!(
                "Method {} does not accept keyword arguments",
                self.name.value
            ))?;
        }
        return stack.execute_method(instance, &self.name.value, positional, context);
    }

    /// When the receiver is a bare name that names a class, the call targets
    /// the dotted function registered for that class method.
    fn class_function_name(&self, stack: &ExecutorStack) -> Option<String> {
        let BaseExpression::VariableExpression(VariableExpression {
            name,
            arguments: None,
            ..
        }) = self.inner.as_ref()
        else {
            return None;
        };

        let function_name = format!("{}.{}", name.value, self.name.value);
        if stack.has_function(&function_name) {
            Some(function_name)
        } else {
            None
        }
    }
}

impl Display for AccessorExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.inner, self.name)?;
        if let Some(arguments) = &self.arguments {
            write!(f, "({arguments})")?;
        }
        return Ok(());
    }
}
