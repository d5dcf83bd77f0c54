use std::{cell::RefCell, rc::Rc};

use crate::{errors::TraceError, executor::values::Value};

use super::records::{
    LoopType, Scope, ScopeType, StatementKind, StatementRecord, StmtRef, VariableSnapshot,
};

/// Records one traced run: the linear execution trace, the variable
/// snapshots, and the scope graph. Execution ids are issued monotonically
/// starting at 1; id 0 denotes "outside any frame". Scope id 0 is the global
/// scope; variable ids start at 1.
#[derive(Debug)]
pub struct ExecutionContext {
    pub execution_trace: Vec<StmtRef>,
    pub variables: Vec<Rc<VariableSnapshot>>,
    pub scopes: Vec<Scope>,

    execution_stack: Vec<StmtRef>,
    scope_stack: Vec<i64>,
    execution_counter: i64,
    var_counter: i64,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            execution_trace: Vec::new(),
            variables: Vec::new(),
            scopes: vec![Scope::new(0, ScopeType::Global, None)],
            execution_stack: Vec::new(),
            scope_stack: vec![0],
            execution_counter: 0,
            var_counter: 0,
        }
    }

    pub fn current_execution(&self) -> Option<&StmtRef> {
        self.execution_stack.last()
    }

    pub fn current_scope_id(&self) -> i64 {
        *self.scope_stack.last().expect("global scope never pops")
    }

    fn generate_execution_id(&mut self) -> i64 {
        self.execution_counter += 1;
        return self.execution_counter;
    }

    fn create_scope(&mut self, scope_type: ScopeType) -> i64 {
        let scope_id = self.scopes.len() as i64;
        let parent = self.current_scope_id();
        self.scopes.push(Scope::new(scope_id, scope_type, Some(parent)));
        self.scopes[parent as usize].children.push(scope_id);
        return scope_id;
    }

    /// Allocates a loop frame. The frame is not pushed; `push_execution`
    /// opens it.
    pub fn create_loop_execution(&mut self, line_number: usize, loop_type: LoopType) -> StmtRef {
        let execution_id = self.generate_execution_id();
        Rc::new(RefCell::new(StatementRecord {
            execution_id,
            scope_id: self.current_scope_id(),
            line_number,
            end_execution_id: None,
            kind: StatementKind::Loop {
                loop_type,
                num_iterations: 0,
            },
        }))
    }

    /// Allocates an iteration frame under the currently open loop frame and
    /// bumps that loop's iteration count.
    pub fn create_loop_iteration(&mut self) -> Result<StmtRef, TraceError> {
        let current = match self.execution_stack.last() {
            Some(current) if matches!(current.borrow().kind, StatementKind::Loop { .. }) => {
                current.clone()
            }
            _ => return Err("No active loop execution to record iteration for.".into()),
        };

        let execution_id = self.generate_execution_id();
        let scope_id = self.current_scope_id();

        let mut current = current.borrow_mut();
        let loop_execution_id = current.execution_id;
        let loop_line_number = current.line_number;
        let StatementKind::Loop { num_iterations, .. } = &mut current.kind else {
            return Err("No active loop execution to record iteration for.".into());
        };

        let iteration = Rc::new(RefCell::new(StatementRecord {
            execution_id,
            scope_id,
            line_number: loop_line_number,
            end_execution_id: None,
            kind: StatementKind::LoopIteration {
                iteration_num: *num_iterations,
                loop_execution_id,
            },
        }));
        *num_iterations += 1;

        return Ok(iteration);
    }

    pub fn create_function_call(
        &mut self,
        line_number: usize,
        func_name: &str,
        func_full_name: &str,
    ) -> StmtRef {
        let execution_id = self.generate_execution_id();
        let func_call_exec_ctx_id = self
            .current_execution()
            .map(|execution| execution.borrow().execution_id)
            .unwrap_or(0);
        Rc::new(RefCell::new(StatementRecord {
            execution_id,
            scope_id: self.current_scope_id(),
            line_number,
            end_execution_id: None,
            kind: StatementKind::FunctionCall {
                func_name: func_name.to_owned(),
                func_full_name: func_full_name.to_owned(),
                func_def_line_num: None,
                arguments: Vec::new(),
                return_value: Value::Null,
                func_call_exec_ctx_id,
            },
        }))
    }

    pub fn create_branch_execution(
        &mut self,
        line_number: usize,
        condition_str: &str,
        condition_result: bool,
    ) -> StmtRef {
        let execution_id = self.generate_execution_id();
        Rc::new(RefCell::new(StatementRecord {
            execution_id,
            scope_id: self.current_scope_id(),
            line_number,
            end_execution_id: None,
            kind: StatementKind::Branch {
                condition_str: condition_str.to_owned(),
                condition_result,
            },
        }))
    }

    /// Appends a snapshot under the current scope and execution (execution
    /// id 0 when no frame is open). `value` must already be a deep copy.
    pub fn record_variable(&mut self, name: &str, value: Value, access_path: &str, line_number: usize) {
        let execution_id = self
            .current_execution()
            .map(|execution| execution.borrow().execution_id)
            .unwrap_or(0);
        self.var_counter += 1;
        self.variables.push(Rc::new(VariableSnapshot {
            var_id: self.var_counter,
            name: name.to_owned(),
            value,
            access_path: access_path.to_owned(),
            line_number,
            scope_id: self.current_scope_id(),
            execution_id,
        }));
    }

    /// Opens a frame: appends it to the trace and the execution stack.
    /// Function-call frames also open a child scope whose lifetime equals the
    /// frame's lifetime.
    pub fn push_execution(&mut self, execution: StmtRef) {
        let is_function_call = execution.borrow().is_function_call();
        self.execution_trace.push(execution.clone());
        self.execution_stack.push(execution);
        if is_function_call {
            let scope_id = self.create_scope(ScopeType::Function);
            self.scope_stack.push(scope_id);
        }
    }

    /// Closes the innermost open frame, stamping its `end_execution_id` with
    /// the current value of the execution counter.
    pub fn pop_execution(&mut self) -> Result<(), TraceError> {
        let Some(execution) = self.execution_stack.pop() else {
            return Err("No open execution frame to pop.".into());
        };
        let mut execution = execution.borrow_mut();
        execution.set_end_execution_id(self.execution_counter);
        if execution.is_function_call() {
            self.scope_stack.pop();
        }
        return Ok(());
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
