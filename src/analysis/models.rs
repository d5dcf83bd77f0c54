use serde::Serialize;

/// A function in the static structure: a definition (with parameters) or a
/// call site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub line_number: usize,
    pub parameters: Vec<String>,
    pub is_definition: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopInfo {
    pub line_number: usize,
    pub loop_type: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchInfo {
    pub line_number: usize,
    pub condition: String,
}

/// The purely lexical element tree: functions, loops and branches nested the
/// way they appear in the source. Indices refer into the flat per-kind lists
/// of `CodeAnalysis` and include every element nested under the node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeTreeNode {
    pub id: usize,
    pub node_type: String,
    pub line_number: usize,
    pub variables: Vec<String>,
    pub function_indices: Vec<usize>,
    pub loop_indices: Vec<usize>,
    pub branch_indices: Vec<usize>,
    pub children: Vec<CodeTreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeAnalysis {
    pub tree: CodeTreeNode,
    pub functions: Vec<FunctionInfo>,
    pub loops: Vec<LoopInfo>,
    pub branches: Vec<BranchInfo>,
    pub variables: Vec<String>,
}
