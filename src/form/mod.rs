use crate::analysis::CodeAnalysis;

pub mod models;

pub use models::{CodeInfo, FormElement, FormOption, FormSchema};

/// Turns a code analysis into the schema the question-builder form renders:
/// the code info tree plus the three selectors (target kind, output type,
/// question type).
pub struct FormBuilder {
    code_analysis: CodeAnalysis,
}

impl FormBuilder {
    pub fn new(code_analysis: CodeAnalysis) -> Self {
        Self { code_analysis }
    }

    pub fn build_form_schema(self) -> FormSchema {
        let form_elements = vec![
            build_target_selector(),
            build_output_type_selector(),
            build_question_type_selector(),
        ];

        let code_info = CodeInfo {
            code_tree: self.code_analysis.tree,
            functions: self.code_analysis.functions,
            loops: self.code_analysis.loops,
            branches: self.code_analysis.branches,
            variables: self.code_analysis.variables,
        };

        return FormSchema {
            code_info,
            form_elements,
        };
    }
}

fn option(id: &str, label: &str, description: &str) -> FormOption {
    FormOption {
        id: id.to_owned(),
        label: label.to_owned(),
        value: id.to_owned(),
        description: description.to_owned(),
    }
}

fn build_target_selector() -> FormElement {
    FormElement {
        id: "target".to_owned(),
        label: "Target".to_owned(),
        element_type: "select".to_owned(),
        options: vec![
            option("function", "Function", "Select function from the code."),
            option("loop", "Loop", "Select loop from the code."),
            option("branch", "Branch", "Select branch from the code."),
            option("variable", "Variable", "Select variable from the code."),
        ],
    }
}

fn build_output_type_selector() -> FormElement {
    FormElement {
        id: "output_type".to_owned(),
        label: "Output type".to_owned(),
        element_type: "select".to_owned(),
        options: vec![
            option("list", "List", "All matching values, in order."),
            option("count", "Count", "How many matches there are."),
            option("first", "First", "The earliest match."),
            option("last", "Last", "The latest match."),
        ],
    }
}

fn build_question_type_selector() -> FormElement {
    FormElement {
        id: "question_type".to_owned(),
        label: "Question type".to_owned(),
        element_type: "select".to_owned(),
        options: vec![
            option("mcq", "Multiple choice", "One correct option."),
            option("mrq", "Multiple response", "Several correct options."),
            option("short_answer", "Short answer", "Free-text answer."),
        ],
    }
}
