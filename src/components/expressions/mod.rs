use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::EvaluationResult,
    executor::{values::Value, ExecutorContext, ExecutorStack},
    lexer::Token,
    utils::iterators::Backtrackable,
    ParserError,
};

use super::operator::Operator;

mod accessor;
mod brackets;
mod collections;
mod index;
mod literals;
mod traced_call;
mod variable;

pub use accessor::AccessorExpression;
pub use brackets::BracketExpression;
pub use collections::{ListExpression, MapExpression};
pub use index::IndexExpression;
pub use literals::{BooleanLiteral, IntegerLiteral, NullLiteral, StringLiteral};
pub use traced_call::TracedCall;
pub use variable::{CallArguments, VariableExpression};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub first: BaseExpression,
    pub operations: Vec<(Operator, BaseExpression)>,
}

impl Expression {
    pub fn new(first: BaseExpression, operations: Vec<(Operator, BaseExpression)>) -> Self {
        Self { first, operations }
    }

    pub fn parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Expression, ParserError> {
        let expression = BaseExpression::parse(tokens)?;
        let mut operations = Vec::new();
        while let Some(operator) = Operator::try_parse(tokens)? {
            operations.push((operator, BaseExpression::parse(tokens)?));
        }

        return Ok(Expression::new(expression, operations));
    }

    pub fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let mut result = self.first.evaluate(stack, context)?;
        let mut previous: Option<&Operator> = None;

        for (operator, expression) in &self.operations {
            let right = expression.evaluate(stack, context)?;
            if let Some(previous) = previous {
                if !previous.chains_with(operator) {
                    return Err(format!(
                        "Chaining {previous:?} with {operator:?} is not supported."
                    ))?;
                }
            }

            result = operator.execute(result, right)?;
            previous = Some(operator);
        }
        return Ok(result);
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.first.fmt(f)?;
        for (operator, expression) in &self.operations {
            write!(f, " {operator} {expression}")?;
        }
        return Ok(());
    }
}

macro_rules! expression_content {
    (
        [$($expression_type:ident,)*],
        [$($dependent_expression:ident,)*],
        [$($synthetic_expression:ident,)*]
    ) => {

        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub enum BaseExpression {
            $(
                $expression_type($expression_type),
            )*
            $(
                $dependent_expression($dependent_expression),
            )*
            $(
                $synthetic_expression($synthetic_expression),
            )*
        }

        impl BaseExpression {
            fn parse_inner<'a, I: Iterator<Item = &'a Token<'a>>>(
                tokens: &mut Backtrackable<I>,
            ) -> Result<Option<Self>, ParserError> {
                $(
                    if let Some(value) = $expression_type::try_parse(tokens)? {
                        return Ok(Some(Self::$expression_type(value)));
                    };
                )*
                return Ok(None);
            }

            fn parse_dependent<'a, I: Iterator<Item = &'a Token<'a>>>(
                mut inner: Self,
                tokens: &mut Backtrackable<I>,
            ) -> Result<Result<Self, Self>, ParserError> {
                $(
                    match $dependent_expression::try_parse(inner, tokens)? {
                        Ok(result) => return Ok(Ok(Self::$dependent_expression(result))),
                        Err(recovered_inner) => {
                            inner = recovered_inner
                        }
                    };
                )*

                return Ok(Err(inner))
            }

            pub fn evaluate(
                &self,
                stack: &mut ExecutorStack,
                context: &mut ExecutorContext,
            ) -> EvaluationResult<Value> {
                match self {
                    $(
                        Self::$expression_type(value) => value.evaluate(stack, context),
                    )*
                    $(
                        Self::$dependent_expression(value) => value.evaluate(stack, context),
                    )*
                    $(
                        Self::$synthetic_expression(value) => value.evaluate(stack, context),
                    )*
                }
            }
        }

        impl Display for BaseExpression {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$expression_type(value) => value.fmt(f),
                    )*
                    $(
                        Self::$dependent_expression(value) => value.fmt(f),
                    )*
                    $(
                        Self::$synthetic_expression(value) => value.fmt(f),
                    )*
                }
            }
        }
    };
}

expression_content!(
    [
        StringLiteral,
        BooleanLiteral,
        NullLiteral,
        IntegerLiteral,
        ListExpression,
        MapExpression,
        BracketExpression,
        VariableExpression,
    ],
    // These expressions are special as they all start with a BaseExpression, to avoid parsing the
    // expressions multiple times and to allow them to be nested within themselves, we have a
    // special flow for them where they are matched after all the other types.
    [AccessorExpression, IndexExpression,],
    // Synthetic expressions are never produced by the parser; the tracer transformer emits them
    // when it rewrites call expressions.
    [TracedCall,]
);

impl BaseExpression {
    fn parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Self, ParserError> {
        let Some(mut value) = Self::parse_inner(tokens)? else {
            return Err("Could not parse a valid expression".into());
        };

        loop {
            match Self::parse_dependent(value, tokens)? {
                Ok(dependent_value) => value = dependent_value,
                Err(value) => return Ok(value),
            }
        }
    }
}

pub(super) trait ExpressionComponent {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError>
    where
        Self: Sized;

    fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value>;
}

pub(super) trait DependentExpressionComponent {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        inner: BaseExpression,
        tokens: &mut Backtrackable<I>,
    ) -> Result<Result<Self, BaseExpression>, ParserError>
    where
        Self: Sized;

    fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value>;
}
