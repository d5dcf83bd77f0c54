pub mod context;
pub mod records;

pub use context::ExecutionContext;
pub use records::{
    LoopType, Scope, ScopeType, StatementKind, StatementRecord, StmtRef, VariableSnapshot,
};
