use crate::trace::ExecutionContext;

use super::models::QuestionSpec;

mod output_modification;
mod query_variation;

pub use output_modification::OutputModificationStrategy;
pub use query_variation::QueryVariationStrategy;

/// A way of manufacturing plausible wrong options from the correct ones.
/// Strategies are consulted in order until enough distinct distractors
/// exist.
#[cfg_attr(test, mockall::automock)]
pub trait DistractorStrategy {
    fn generate(
        &self,
        correct_options: &[serde_json::Value],
        context: &ExecutionContext,
        spec: &QuestionSpec,
        num_distractors: usize,
    ) -> Vec<serde_json::Value>;
}

pub struct DistractorGenerator {
    strategies: Vec<Box<dyn DistractorStrategy>>,
}

impl DistractorGenerator {
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(QueryVariationStrategy::new()),
                Box::new(OutputModificationStrategy::new()),
            ],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn DistractorStrategy>>) -> Self {
        Self { strategies }
    }

    /// Collects up to `num_distractors` options that are distinct from each
    /// other and from every correct option.
    pub fn generate_distractors(
        &self,
        correct_options: &[serde_json::Value],
        context: &ExecutionContext,
        spec: &QuestionSpec,
        num_distractors: usize,
    ) -> Vec<serde_json::Value> {
        let mut distractors: Vec<serde_json::Value> = Vec::new();
        let mut seen: Vec<String> = correct_options
            .iter()
            .map(|option| option.to_string())
            .collect();

        for strategy in &self.strategies {
            if distractors.len() >= num_distractors {
                break;
            }

            for distractor in
                strategy.generate(correct_options, context, spec, num_distractors)
            {
                let key = distractor.to_string();
                if !seen.contains(&key) {
                    seen.push(key);
                    distractors.push(distractor);
                }
                if distractors.len() >= num_distractors {
                    break;
                }
            }
        }

        distractors.truncate(num_distractors);
        return distractors;
    }
}

impl Default for DistractorGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::question::models::{OutputType, QuestionType, TargetElement, TargetElementType};

    use super::*;

    fn test_spec() -> QuestionSpec {
        QuestionSpec {
            target: vec![TargetElement::new(TargetElementType::Variable).with_name("x")],
            output_type: OutputType::Last,
            question_type: QuestionType::Mcq,
        }
    }

    #[test]
    fn should_consult_strategies_in_order_until_enough() {
        let mut first = MockDistractorStrategy::new();
        first
            .expect_generate()
            .returning(|_, _, _, _| vec![serde_json::json!(1), serde_json::json!(2)]);
        let mut second = MockDistractorStrategy::new();
        second
            .expect_generate()
            .returning(|_, _, _, _| vec![serde_json::json!(3)]);

        let generator =
            DistractorGenerator::with_strategies(vec![Box::new(first), Box::new(second)]);
        let distractors = generator.generate_distractors(
            &[serde_json::json!(0)],
            &ExecutionContext::new(),
            &test_spec(),
            3,
        );
        assert_eq!(
            distractors,
            vec![
                serde_json::json!(1),
                serde_json::json!(2),
                serde_json::json!(3)
            ]
        );
    }

    #[test]
    fn should_skip_duplicates_and_correct_options() {
        let mut strategy = MockDistractorStrategy::new();
        strategy.expect_generate().returning(|_, _, _, _| {
            vec![
                serde_json::json!(7),
                serde_json::json!(7),
                serde_json::json!(9),
            ]
        });

        let generator = DistractorGenerator::with_strategies(vec![Box::new(strategy)]);
        let distractors = generator.generate_distractors(
            &[serde_json::json!(9)],
            &ExecutionContext::new(),
            &test_spec(),
            4,
        );
        assert_eq!(distractors, vec![serde_json::json!(7)]);
    }

    #[test]
    fn should_stop_once_the_requested_count_is_reached() {
        let mut strategy = MockDistractorStrategy::new();
        strategy.expect_generate().returning(|_, _, _, _| {
            (0..10).map(|value| serde_json::json!(value)).collect()
        });

        let generator = DistractorGenerator::with_strategies(vec![Box::new(strategy)]);
        let distractors = generator.generate_distractors(
            &[serde_json::json!(99)],
            &ExecutionContext::new(),
            &test_spec(),
            2,
        );
        assert_eq!(distractors.len(), 2);
    }
}
