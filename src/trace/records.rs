use std::{cell::RefCell, rc::Rc};

use serde::Serialize;

use crate::{errors::TraceError, executor::values::Value};

/// Shared handle to a statement-execution record. The linear trace and the
/// execution stack alias the same record, so closing a frame or recording
/// arguments is visible through both.
pub type StmtRef = Rc<RefCell<StatementRecord>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopType {
    For,
    While,
}

impl LoopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopType::For => "for",
            LoopType::While => "while",
        }
    }
}

/// One statement-execution frame in the trace. `end_execution_id` is stamped
/// when the frame is popped and is `None` only while the frame is still open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementRecord {
    pub execution_id: i64,
    pub scope_id: i64,
    pub line_number: usize,
    pub end_execution_id: Option<i64>,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StatementKind {
    Loop {
        loop_type: LoopType,
        num_iterations: usize,
    },
    LoopIteration {
        iteration_num: usize,
        loop_execution_id: i64,
    },
    FunctionCall {
        func_name: String,
        func_full_name: String,
        func_def_line_num: Option<usize>,
        arguments: Vec<(String, Value)>,
        return_value: Value,
        func_call_exec_ctx_id: i64,
    },
    Branch {
        condition_str: String,
        condition_result: bool,
    },
}

impl StatementRecord {
    pub fn stmt_type(&self) -> &'static str {
        match &self.kind {
            StatementKind::Loop { .. } => "loop",
            StatementKind::LoopIteration { .. } => "loop_iteration",
            StatementKind::FunctionCall { .. } => "function",
            StatementKind::Branch { .. } => "branch",
        }
    }

    pub fn set_end_execution_id(&mut self, end_execution_id: i64) {
        self.end_execution_id = Some(end_execution_id);
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self.kind, StatementKind::FunctionCall { .. })
    }

    pub fn reset_args(&mut self) -> Result<(), TraceError> {
        let StatementKind::FunctionCall { arguments, .. } = &mut self.kind else {
            return Err("No active function call to reset arguments for.".into());
        };
        arguments.clear();
        return Ok(());
    }

    pub fn add_arg(&mut self, name: &str, value: Value) -> Result<(), TraceError> {
        let StatementKind::FunctionCall { arguments, .. } = &mut self.kind else {
            return Err("No active function call to record an argument for.".into());
        };
        arguments.push((name.to_owned(), value));
        return Ok(());
    }

    pub fn set_func_def_line_num(&mut self, line_num: usize) -> Result<(), TraceError> {
        let StatementKind::FunctionCall {
            func_def_line_num, ..
        } = &mut self.kind
        else {
            return Err("No active function call to record a definition line for.".into());
        };
        *func_def_line_num = Some(line_num);
        return Ok(());
    }

    pub fn set_return_value(&mut self, value: Value) -> Result<(), TraceError> {
        let StatementKind::FunctionCall { return_value, .. } = &mut self.kind else {
            return Err("No active function call to record a return value for.".into());
        };
        *return_value = value;
        return Ok(());
    }
}

/// A variable's value at a specific point in execution. The value is a deep
/// copy taken at record time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSnapshot {
    pub var_id: i64,
    pub name: String,
    pub value: Value,
    pub access_path: String,
    pub line_number: usize,
    pub scope_id: i64,
    pub execution_id: i64,
}

impl VariableSnapshot {
    pub fn stmt_type(&self) -> &'static str {
        "variable"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Global,
    Function,
    Class,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Global => "global",
            ScopeType::Function => "function",
            ScopeType::Class => "class",
        }
    }
}

/// A node in the scope tree. Scopes are stored by id in the execution
/// context; parent/child links are ids, children in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub scope_id: i64,
    pub scope_type: ScopeType,
    pub parent: Option<i64>,
    pub children: Vec<i64>,
}

impl Scope {
    pub fn new(scope_id: i64, scope_type: ScopeType, parent: Option<i64>) -> Self {
        Self {
            scope_id,
            scope_type,
            parent,
            children: Vec::new(),
        }
    }
}
