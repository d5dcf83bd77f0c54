use std::cell::RefCell;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{errors::EngineError, query::Row, tracer::StepTracer};

pub mod distractors;
pub mod models;
pub mod query_generator;
pub mod text_generator;

use distractors::DistractorGenerator;
use models::{ExecutionSpec, GenerationOptions, Question, QuestionSpec, QuestionType};
use query_generator::QueryGenerator;
use text_generator::TextGenerator;

/// End-to-end question generation: question text from the spec, a traced run
/// of the code, the compiled query for the answer, and distractor options
/// for choice questions.
pub struct QuestionGenerator {
    step_tracer: StepTracer,
    text_generator: TextGenerator,
    distractor_generator: DistractorGenerator,
    rng: RefCell<StdRng>,
}

impl QuestionGenerator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Seeded construction keeps option shuffling reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            step_tracer: StepTracer::new(),
            text_generator: TextGenerator::new(),
            distractor_generator: DistractorGenerator::new(),
            rng: RefCell::new(rng),
        }
    }

    pub fn generate_question(
        &self,
        code: &str,
        question_spec: &QuestionSpec,
        execution_spec: &ExecutionSpec,
        generation_options: &GenerationOptions,
    ) -> Result<Question, EngineError> {
        let text = self
            .text_generator
            .generate_question(question_spec, Some(&execution_spec.test_data));

        let context = self.step_tracer.trace_with_input(
            code,
            &execution_spec.entry_function,
            &execution_spec.test_data,
        )?;

        let query = QueryGenerator::new(&context.trace)
            .generate(&question_spec.target, question_spec.output_type)?;
        let results = query.execute()?;
        let answer = format_results(&results);

        let mut options = None;
        let mut correct_indices = None;

        if matches!(
            question_spec.question_type,
            QuestionType::Mcq | QuestionType::Mrq
        ) {
            let result_values = results.iter().map(Row::to_json).collect::<Vec<_>>();
            let correct_options = match question_spec.question_type {
                QuestionType::Mrq => result_values,
                _ => vec![serde_json::Value::Array(result_values)],
            };

            let distractors = self.distractor_generator.generate_distractors(
                &correct_options,
                &context.trace,
                question_spec,
                generation_options.num_distractors,
            );

            let mut all_options = correct_options.clone();
            all_options.extend(distractors);
            let (shuffled, indices) = self.shuffle_options(all_options, correct_options.len());
            options = Some(shuffled);
            correct_indices = Some(indices);
        }

        return Ok(Question {
            text,
            answer,
            options,
            correct_indices,
            question_type: question_spec.question_type,
        });
    }

    /// A preview of the question shape without executing any code: template
    /// text plus placeholder options.
    pub fn generate_template_preview(
        &self,
        question_spec: &QuestionSpec,
        generation_options: &GenerationOptions,
    ) -> Question {
        let text = self.text_generator.generate_question(question_spec, None);

        let mut options = None;
        let mut correct_indices = None;
        if matches!(
            question_spec.question_type,
            QuestionType::Mcq | QuestionType::Mrq
        ) {
            let num_options = generation_options.num_distractors + 1;
            options = Some(
                (0..num_options)
                    .map(|index| serde_json::Value::from(format!("<option_{}>", index + 1)))
                    .collect(),
            );
            correct_indices = Some(vec![0]);
        }

        return Question {
            text,
            answer: "<placeholder_answer>".to_owned(),
            options,
            correct_indices,
            question_type: question_spec.question_type,
        };
    }

    /// Shuffles options while tracking where the correct answers (the first
    /// `num_correct` inputs) end up.
    fn shuffle_options(
        &self,
        options: Vec<serde_json::Value>,
        num_correct: usize,
    ) -> (Vec<serde_json::Value>, Vec<usize>) {
        let mut indexed = options.into_iter().enumerate().collect::<Vec<_>>();
        indexed.shuffle(&mut *self.rng.borrow_mut());

        let correct_indices = indexed
            .iter()
            .enumerate()
            .filter(|(_, (old_index, _))| *old_index < num_correct)
            .map(|(new_index, _)| new_index)
            .collect();
        let shuffled = indexed.into_iter().map(|(_, option)| option).collect();

        return (shuffled, correct_indices);
    }
}

impl Default for QuestionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn format_results(results: &[Row]) -> String {
    let formatted = results
        .iter()
        .map(|row| row.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    return format!("[{formatted}]");
}

#[cfg(test)]
mod tests {
    use crate::question::models::{OutputType, TargetElement, TargetElementType};

    use super::*;

    fn execution_spec(entry: &str, data: &[(&str, serde_json::Value)]) -> ExecutionSpec {
        let mut test_data = serde_json::Map::new();
        for (key, value) in data {
            test_data.insert((*key).to_owned(), value.clone());
        }
        ExecutionSpec {
            entry_function: entry.to_owned(),
            test_data,
        }
    }

    #[test]
    fn should_generate_a_short_answer_question_end_to_end() {
        let code = "func total(values) {\n  sum = 0;\n  for v in values {\n    sum = sum + v;\n  }\n  return sum;\n}\n";
        let generator = QuestionGenerator::with_seed(3);

        let question = generator
            .generate_question(
                code,
                &QuestionSpec {
                    target: vec![TargetElement::new(TargetElementType::Variable).with_name("sum")],
                    output_type: OutputType::Last,
                    question_type: QuestionType::ShortAnswer,
                },
                &execution_spec("total", &[("values", serde_json::json!([2, 3, 4]))]),
                &GenerationOptions::default(),
            )
            .unwrap();

        assert_eq!(question.answer, "[9]");
        assert!(question.options.is_none());
        assert!(question.text.contains("variable `sum`"));
    }

    #[test]
    fn should_generate_mcq_options_with_tracked_correct_indices() {
        let code = "func total(values) {\n  sum = 0;\n  for v in values {\n    sum = sum + v;\n  }\n  return sum;\n}\n";
        let generator = QuestionGenerator::with_seed(3);

        let question = generator
            .generate_question(
                code,
                &QuestionSpec {
                    target: vec![TargetElement::new(TargetElementType::Variable).with_name("sum")],
                    output_type: OutputType::Last,
                    question_type: QuestionType::Mcq,
                },
                &execution_spec("total", &[("values", serde_json::json!([2, 3, 4]))]),
                &GenerationOptions::default(),
            )
            .unwrap();

        let options = question.options.unwrap();
        let correct_indices = question.correct_indices.unwrap();
        assert_eq!(correct_indices.len(), 1);
        assert_eq!(options[correct_indices[0]], serde_json::json!([9]));
        assert!(options.len() > 1, "distractors should be present");
    }

    #[test]
    fn template_preview_should_use_placeholders() {
        let generator = QuestionGenerator::with_seed(1);
        let question = generator.generate_template_preview(
            &QuestionSpec {
                target: vec![TargetElement::new(TargetElementType::Variable).with_name("x")],
                output_type: OutputType::Last,
                question_type: QuestionType::Mcq,
            },
            &GenerationOptions::default(),
        );

        assert_eq!(question.answer, "<placeholder_answer>");
        assert_eq!(question.options.as_ref().unwrap().len(), 5);
        assert_eq!(question.correct_indices, Some(vec![0]));
    }
}
