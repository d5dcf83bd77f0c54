use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::{EvaluationException, EvaluationResult},
    executor::{values::Value, ExecutorContext, ExecutorStack},
    trace::StmtRef,
};

use super::BaseExpression;

/// A call expression wrapped by the tracer transformer. Evaluation opens a
/// function-call frame, hands the frame to the wrapped call so arguments are
/// recorded as deep copies while they are evaluated once in source order,
/// records the deep-copied return value, and closes the frame on every exit
/// path. Because all of this happens in place, the containing expression
/// observes only the final value and argument evaluation order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TracedCall {
    pub line: usize,
    pub func_name: String,
    pub func_full_name: String,
    pub inner: Box<BaseExpression>,
}

impl TracedCall {
    pub fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let frame =
            context
                .trace
                .create_function_call(self.line, &self.func_name, &self.func_full_name);
        context.trace.push_execution(frame.clone());

        let result = self.evaluate_within_frame(&frame, stack, context);

        // The frame closes before the result propagates, also on error and
        // on control-flow unwinds.
        context
            .trace
            .pop_execution()
            .map_err(EvaluationException::from)?;
        return result;
    }

    // The wrapped expression keeps its own call dispatch; tracing only adds
    // the frame and the return-value record.
    fn evaluate_within_frame(
        &self,
        frame: &StmtRef,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let value = match self.inner.as_ref() {
            BaseExpression::VariableExpression(call) => {
                call.evaluate_call(Some(frame), stack, context)?
            }
            BaseExpression::AccessorExpression(call) => {
                call.evaluate_call(Some(frame), stack, context)?
            }
            _ => return Err("Traced call must wrap a call expression".into()),
        };

        frame
            .borrow_mut()
            .set_return_value(value.deep_copy())
            .map_err(EvaluationException::from)?;
        return Ok(value);
    }
}

impl Display for TracedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}
