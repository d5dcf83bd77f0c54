use super::models::{OutputType, QuestionSpec, QuestionType, TargetElement, TargetElementType, TargetModifier};

/// Composes question text from a question spec by templating: a context
/// phrase per leading target element, a target phrase for the final element
/// and output type, the question-type instruction, and the input data.
pub struct TextGenerator {}

impl TextGenerator {
    pub fn new() -> Self {
        Self {}
    }

    pub fn generate_question(
        &self,
        spec: &QuestionSpec,
        input_data: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> String {
        let Some((target, context_targets)) = spec.target.split_last() else {
            return "During execution, what happens? Provide the answer.".to_owned();
        };

        let context = self.build_context(context_targets);
        let target_phrase = self.build_target(target, spec.output_type);
        let question_type_phrase = self.build_question_type(spec.question_type);
        let input_data_phrase = self.build_input_data_phrase(input_data);

        return format!(
            "{context}, {target_phrase}? {question_type_phrase}\nGiven input: {input_data_phrase}"
        );
    }

    fn build_context(&self, targets: &[TargetElement]) -> String {
        let mut context_parts: Vec<String> = Vec::new();

        for target in targets {
            match target.element_type {
                TargetElementType::Function => {
                    let func_name = target.name.as_deref().unwrap_or("function");
                    let line_info = match target.line_number {
                        Some(line) => format!(" (line {line})"),
                        None => String::new(),
                    };
                    context_parts.push(format!("for each `{func_name}()` call{line_info}"));
                }
                TargetElementType::Loop => {
                    if target.modifier == Some(TargetModifier::LoopIterations) {
                        context_parts.push(match target.line_number {
                            Some(line) => format!("for each loop iteration (line {line})"),
                            None => "for each loop iteration".to_owned(),
                        });
                    } else {
                        context_parts.push(match target.line_number {
                            Some(line) => format!("in the loop at line {line}"),
                            None => "in the loop".to_owned(),
                        });
                    }
                }
                TargetElementType::Branch => {
                    let name = target.name.as_deref().unwrap_or("condition");
                    let line_info = match target.line_number {
                        Some(line) => format!(" (line {line})"),
                        None => String::new(),
                    };
                    context_parts.push(format!("in each `{name}` branch{line_info}"));
                    match target.modifier {
                        Some(TargetModifier::BranchTrue) => {
                            context_parts.push("when the condition is true".to_owned())
                        }
                        Some(TargetModifier::BranchFalse) => {
                            context_parts.push("when the condition is false".to_owned())
                        }
                        _ => {}
                    }
                }
                TargetElementType::Variable => {}
            }
        }

        if let Some(first) = context_parts.first_mut() {
            let mut characters = first.chars();
            if let Some(head) = characters.next() {
                let capitalised = head.to_uppercase().collect::<String>() + characters.as_str();
                *first = capitalised;
            }
            return context_parts.join(", ");
        }

        return "During execution".to_owned();
    }

    fn build_target(&self, target: &TargetElement, output_type: OutputType) -> String {
        match target.element_type {
            TargetElementType::Function => self.build_function_target(target, output_type),
            TargetElementType::Loop => self.build_loop_target(target, output_type),
            TargetElementType::Branch => self.build_branch_target(target, output_type),
            TargetElementType::Variable => self.build_variable_target(target, output_type),
        }
    }

    fn build_function_target(&self, target: &TargetElement, output_type: OutputType) -> String {
        let name = target.name.as_deref().unwrap_or("function");

        if output_type == OutputType::Count {
            return match target.modifier {
                Some(TargetModifier::Arguments) => format!(
                    "how many unique sets of arguments were passed to function `{name}()`"
                ),
                Some(TargetModifier::ReturnValue) => format!(
                    "how many unique return values were produced by function `{name}()`"
                ),
                _ => format!("how many times was function `{name}()` called"),
            };
        }

        let quantifier = match output_type {
            OutputType::First => "the first",
            OutputType::Last => "the last",
            _ => "each",
        };

        return match target.modifier {
            Some(TargetModifier::Arguments) => {
                format!("what are the arguments passed to {quantifier} function `{name}()` call")
            }
            Some(TargetModifier::ReturnValue) => {
                format!("what is the return value of {quantifier} function `{name}()` call")
            }
            _ => {
                if output_type == OutputType::List {
                    format!("what are the function `{name}()` calls")
                } else {
                    format!("what is {quantifier} function `{name}()` call")
                }
            }
        };
    }

    fn build_loop_target(&self, target: &TargetElement, output_type: OutputType) -> String {
        let line = target.line_number.unwrap_or(0);

        if target.modifier == Some(TargetModifier::LoopIterations) {
            return match output_type {
                OutputType::Count => format!(
                    "how many loop iterations are there in each loop execution (line {line})"
                ),
                OutputType::First => format!(
                    "what is the first loop iteration for each loop execution (line {line})"
                ),
                OutputType::Last => format!(
                    "what is the last loop iteration for each loop execution (line {line})"
                ),
                OutputType::List => format!(
                    "what are the loop iterations for each loop execution (line {line})"
                ),
            };
        }

        return match output_type {
            OutputType::Count => format!("how many times does the loop (line {line}) execute"),
            OutputType::First => format!("what is the first execution of the loop (line {line})"),
            OutputType::Last => format!("what is the last execution of the loop (line {line})"),
            OutputType::List => format!("what are the executions of the loop (line {line})"),
        };
    }

    fn build_branch_target(&self, target: &TargetElement, output_type: OutputType) -> String {
        let question = match output_type {
            OutputType::Count => "how many times do",
            OutputType::List => "what are the times",
            OutputType::First => "what is the first time",
            OutputType::Last => "what is the last time",
        };

        let context = match target.modifier {
            Some(TargetModifier::BranchTrue) => " when the condition is true",
            Some(TargetModifier::BranchFalse) => " when the condition is false",
            _ => "",
        };

        let name = target.name.as_deref().unwrap_or("condition");
        let line = target.line_number.unwrap_or(0);
        return format!("{question} we enter the branch `{name}` (line {line}){context}");
    }

    fn build_variable_target(&self, target: &TargetElement, output_type: OutputType) -> String {
        let name = target.name.as_deref().unwrap_or("variable");
        return match output_type {
            OutputType::Count => format!("how many times was the variable `{name}` modified"),
            OutputType::First => {
                format!("what is the value of the variable `{name}` at the beginning")
            }
            OutputType::Last => format!("what is the value of the variable `{name}` at the end"),
            OutputType::List => format!("what are the values of the variable `{name}`"),
        };
    }

    fn build_question_type(&self, question_type: QuestionType) -> &'static str {
        match question_type {
            QuestionType::Mcq => "Choose the correct option.",
            QuestionType::Mrq => "Select all that apply.",
            QuestionType::ShortAnswer => "Provide the answer.",
        }
    }

    fn build_input_data_phrase(
        &self,
        input_data: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> String {
        let Some(input_data) = input_data else {
            return "<input_data>".to_owned();
        };
        if input_data.is_empty() {
            return String::new();
        }

        return input_data
            .iter()
            .map(|(key, value)| format!("{key} = {value}"))
            .collect::<Vec<_>>()
            .join(", ");
    }
}

impl Default for TextGenerator {
    fn default() -> Self {
        Self::new()
    }
}
