use crate::{
    errors::QueryEngineError,
    question::{
        models::{OutputType, QuestionSpec, TargetElement, TargetModifier},
        query_generator::QueryGenerator,
    },
    query::Row,
    trace::ExecutionContext,
};

use super::DistractorStrategy;

/// Builds wrong options by answering a slightly different question against
/// the same trace: a different output shape, a target path with a context
/// layer removed, or a flipped/removed modifier. Results are shaped to match
/// the correct answer's format and deduplicated against it.
pub struct QueryVariationStrategy {}

impl QueryVariationStrategy {
    pub fn new() -> Self {
        Self {}
    }

    fn output_type_variations(
        &self,
        context: &ExecutionContext,
        spec: &QuestionSpec,
    ) -> Vec<serde_json::Value> {
        if !matches!(spec.output_type, OutputType::First | OutputType::Last) {
            return Vec::new();
        }
        run_query(context, &spec.target, OutputType::List).unwrap_or_default()
    }

    fn target_path_variations(
        &self,
        context: &ExecutionContext,
        spec: &QuestionSpec,
        num_distractors: usize,
    ) -> Vec<serde_json::Value> {
        let mut variations = Vec::new();
        if spec.target.len() <= 1 {
            return variations;
        }

        // Remove one context layer at a time.
        for index in 0..spec.target.len() - 1 {
            let mut modified = spec.target.clone();
            modified.remove(index);
            if let Ok(results) = run_query(context, &modified, spec.output_type) {
                variations.extend(results);
            }
            if variations.len() >= num_distractors {
                return variations;
            }
        }

        // Only the innermost element, with all context dropped.
        let modified = vec![spec.target[spec.target.len() - 1].clone()];
        if let Ok(results) = run_query(context, &modified, spec.output_type) {
            variations.extend(results);
        }

        return variations;
    }

    fn modifier_variations(
        &self,
        context: &ExecutionContext,
        spec: &QuestionSpec,
    ) -> Vec<serde_json::Value> {
        let Some(last) = spec.target.last() else {
            return Vec::new();
        };

        let replacements: Vec<Option<TargetModifier>> = match last.modifier {
            Some(TargetModifier::BranchTrue) => vec![Some(TargetModifier::BranchFalse), None],
            Some(TargetModifier::BranchFalse) => vec![Some(TargetModifier::BranchTrue), None],
            Some(TargetModifier::LoopIterations) => vec![None],
            Some(TargetModifier::Arguments) => vec![Some(TargetModifier::ReturnValue)],
            Some(TargetModifier::ReturnValue) => vec![Some(TargetModifier::Arguments)],
            None => Vec::new(),
        };

        let mut variations = Vec::new();
        for replacement in replacements {
            let mut modified = spec.target.clone();
            if let Some(element) = modified.last_mut() {
                element.modifier = replacement;
            }
            if let Ok(results) = run_query(context, &modified, spec.output_type) {
                variations.extend(results);
            }
        }
        return variations;
    }
}

impl DistractorStrategy for QueryVariationStrategy {
    fn generate(
        &self,
        correct_options: &[serde_json::Value],
        context: &ExecutionContext,
        spec: &QuestionSpec,
        num_distractors: usize,
    ) -> Vec<serde_json::Value> {
        let Some(correct) = correct_options.first() else {
            return Vec::new();
        };

        let mut raw = Vec::new();
        raw.extend(self.output_type_variations(context, spec));
        raw.extend(self.target_path_variations(context, spec, num_distractors));
        raw.extend(self.modifier_variations(context, spec));

        let mut distractors = Vec::new();
        let mut seen = correct_options
            .iter()
            .map(|option| option.to_string())
            .collect::<Vec<_>>();

        for candidate in raw {
            let Some(formatted) = match_answer_format(correct, candidate) else {
                continue;
            };
            let key = formatted.to_string();
            if !seen.contains(&key) {
                seen.push(key);
                distractors.push(formatted);
            }
            if distractors.len() >= num_distractors {
                break;
            }
        }

        return distractors;
    }
}

impl Default for QueryVariationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

fn run_query(
    context: &ExecutionContext,
    target: &[TargetElement],
    output_type: OutputType,
) -> Result<Vec<serde_json::Value>, QueryEngineError> {
    let rows = QueryGenerator::new(context)
        .generate(target, output_type)?
        .execute()?;
    return Ok(rows.iter().map(Row::to_json).collect());
}

/// Shapes a candidate like the correct answer: lists stay lists, scalars get
/// unwrapped from singleton lists, and everything else must already match.
fn match_answer_format(
    correct: &serde_json::Value,
    candidate: serde_json::Value,
) -> Option<serde_json::Value> {
    let correct_is_array = correct.is_array();
    match (correct_is_array, candidate) {
        (true, candidate @ serde_json::Value::Array(_)) => Some(candidate),
        (true, candidate) => Some(serde_json::Value::Array(vec![candidate])),
        (false, serde_json::Value::Array(items)) => {
            if items.len() == 1 {
                items.into_iter().next()
            } else {
                None
            }
        }
        (false, candidate) => {
            if discriminant_matches(correct, &candidate) {
                Some(candidate)
            } else {
                None
            }
        }
    }
}

fn discriminant_matches(left: &serde_json::Value, right: &serde_json::Value) -> bool {
    matches!(
        (left, right),
        (serde_json::Value::Null, serde_json::Value::Null)
            | (serde_json::Value::Bool(_), serde_json::Value::Bool(_))
            | (serde_json::Value::Number(_), serde_json::Value::Number(_))
            | (serde_json::Value::String(_), serde_json::Value::String(_))
            | (serde_json::Value::Object(_), serde_json::Value::Object(_))
    )
}

#[cfg(test)]
mod tests {
    use crate::{
        question::models::{QuestionType, TargetElementType},
        tracer::StepTracer,
    };

    use super::*;

    fn trace(source: &str) -> ExecutionContext {
        StepTracer::new().trace(source).unwrap().trace
    }

    #[test]
    fn should_offer_the_value_history_for_a_last_value_question() {
        let context = trace("x = 1;\nx = 2;\nx = 3;\n");
        let spec = QuestionSpec {
            target: vec![TargetElement::new(TargetElementType::Variable).with_name("x")],
            output_type: OutputType::Last,
            question_type: QuestionType::Mcq,
        };

        let strategy = QueryVariationStrategy::new();
        let distractors = strategy.generate(
            &[serde_json::json!(3)],
            &context,
            &spec,
            4,
        );

        // The list-shaped history collapses to scalars that differ from the
        // correct answer.
        assert!(distractors.contains(&serde_json::json!(1)));
        assert!(distractors.contains(&serde_json::json!(2)));
        assert!(!distractors.contains(&serde_json::json!(3)));
    }

    #[test]
    fn should_flip_branch_modifiers() {
        let context = trace("x = 5;\nif x > 0 {\n  y = 1;\n} else {\n  y = 0 - 1;\n}\n");
        let spec = QuestionSpec {
            target: vec![TargetElement::new(TargetElementType::Branch)
                .with_modifier(TargetModifier::BranchTrue)],
            output_type: OutputType::Count,
            question_type: QuestionType::Mcq,
        };

        let strategy = QueryVariationStrategy::new();
        let distractors = strategy.generate(&[serde_json::json!(1)], &context, &spec, 4);

        // The branch_false count (0) is a plausible wrong answer.
        assert!(distractors.contains(&serde_json::json!(0)));
    }

    #[test]
    fn should_drop_context_layers() {
        let context = trace("x = 9;\nfor i in range(2) {\n  x = i;\n}\n");
        let spec = QuestionSpec {
            target: vec![
                TargetElement::new(TargetElementType::Loop).with_line_number(2),
                TargetElement::new(TargetElementType::Variable).with_name("x"),
            ],
            output_type: OutputType::List,
            question_type: QuestionType::Mcq,
        };

        let correct = serde_json::json!([0, 1]);
        let strategy = QueryVariationStrategy::new();
        let distractors = strategy.generate(&[correct.clone()], &context, &spec, 4);

        assert!(!distractors.is_empty());
        assert!(!distractors.contains(&correct));
    }
}
