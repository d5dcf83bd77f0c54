use serde::{Deserialize, Serialize};

use crate::errors::QueryEngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetElementType {
    Function,
    Loop,
    Branch,
    Variable,
}

impl TargetElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetElementType::Function => "function",
            TargetElementType::Loop => "loop",
            TargetElementType::Branch => "branch",
            TargetElementType::Variable => "variable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetModifier {
    Arguments,
    ReturnValue,
    LoopIterations,
    BranchTrue,
    BranchFalse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    List,
    Count,
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    Mrq,
    ShortAnswer,
}

/// One element of a target path. Elements nest from outermost to innermost;
/// the modifier narrows the element to a sub-aspect and must be compatible
/// with the element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetElement {
    #[serde(rename = "type")]
    pub element_type: TargetElementType,
    #[serde(default)]
    pub id: Vec<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub line_number: Option<usize>,
    #[serde(default)]
    pub modifier: Option<TargetModifier>,
}

impl TargetElement {
    pub fn new(element_type: TargetElementType) -> Self {
        Self {
            element_type,
            id: Vec::new(),
            name: None,
            line_number: None,
            modifier: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        return self;
    }

    pub fn with_line_number(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        return self;
    }

    pub fn with_modifier(mut self, modifier: TargetModifier) -> Self {
        self.modifier = Some(modifier);
        return self;
    }

    pub fn validate(&self) -> Result<(), QueryEngineError> {
        let Some(modifier) = self.modifier else {
            return Ok(());
        };

        let valid = match modifier {
            TargetModifier::Arguments | TargetModifier::ReturnValue => {
                self.element_type == TargetElementType::Function
            }
            TargetModifier::LoopIterations => self.element_type == TargetElementType::Loop,
            TargetModifier::BranchTrue | TargetModifier::BranchFalse => {
                self.element_type == TargetElementType::Branch
            }
        };

        if !valid {
            return Err(format!(
                "Modifier {modifier:?} is not valid for {} targets.",
                self.element_type.as_str()
            )
            .into());
        }
        return Ok(());
    }
}

/// What to ask: the target path, the output shape, and the question format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub target: Vec<TargetElement>,
    pub output_type: OutputType,
    pub question_type: QuestionType,
}

/// How to run the traced program: the entry function and its keyword input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSpec {
    pub entry_function: String,
    pub test_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default = "default_num_distractors")]
    pub num_distractors: usize,
}

fn default_num_distractors() -> usize {
    4
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            num_distractors: default_num_distractors(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_indices: Option<Vec<usize>>,
    pub question_type: QuestionType,
}
