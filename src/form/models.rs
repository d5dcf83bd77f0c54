use serde::Serialize;

use crate::analysis::{BranchInfo, CodeTreeNode, FunctionInfo, LoopInfo};

/// One choice in a selector form element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormOption {
    pub id: String,
    pub label: String,
    pub value: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormElement {
    pub id: String,
    pub label: String,
    pub element_type: String,
    pub options: Vec<FormOption>,
}

/// Everything the form needs to know about the analysed code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeInfo {
    pub code_tree: CodeTreeNode,
    pub functions: Vec<FunctionInfo>,
    pub loops: Vec<LoopInfo>,
    pub branches: Vec<BranchInfo>,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub code_info: CodeInfo,
    pub form_elements: Vec<FormElement>,
}
