use std::cell::RefCell;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    question::models::{QuestionSpec, QuestionType},
    trace::ExecutionContext,
};

use super::DistractorStrategy;

/// Builds wrong options by perturbing the correct output: integers move to
/// nearby values on the same side of zero, lists get permuted, and map
/// values get nudged. Single-choice questions vary one element of the
/// correct option at a time; multi-response questions vary whole options.
pub struct OutputModificationStrategy {
    rng: RefCell<StdRng>,
}

impl OutputModificationStrategy {
    pub fn new() -> Self {
        Self {
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn generate_mcq_distractors(
        &self,
        correct_option: &serde_json::Value,
        num_needed: usize,
    ) -> Vec<serde_json::Value> {
        let mut distractors = Vec::new();
        let mut seen = vec![correct_option.to_string()];

        let serde_json::Value::Array(items) = correct_option else {
            return distractors;
        };

        for (index, item) in items.iter().enumerate() {
            if distractors.len() >= num_needed {
                break;
            }

            let variations = self.variations_of(item, num_needed - distractors.len());
            for variation in variations {
                let mut new_option = items.clone();
                new_option[index] = variation;
                add_distractor(
                    &mut distractors,
                    &mut seen,
                    serde_json::Value::Array(new_option),
                );
            }
        }

        distractors.truncate(num_needed);
        return distractors;
    }

    fn generate_mrq_distractors(
        &self,
        correct_options: &[serde_json::Value],
        num_needed: usize,
    ) -> Vec<serde_json::Value> {
        let mut distractors = Vec::new();
        let mut seen = correct_options
            .iter()
            .map(|option| option.to_string())
            .collect::<Vec<_>>();

        for correct_option in correct_options {
            if distractors.len() >= num_needed {
                break;
            }
            for variation in self.variations_of(correct_option, num_needed - distractors.len()) {
                add_distractor(&mut distractors, &mut seen, variation);
            }
        }

        distractors.truncate(num_needed);
        return distractors;
    }

    fn variations_of(&self, value: &serde_json::Value, num_needed: usize) -> Vec<serde_json::Value> {
        match value {
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => numeric_variations(value, num_needed, 3)
                    .into_iter()
                    .map(serde_json::Value::from)
                    .collect(),
                None => Vec::new(),
            },
            serde_json::Value::Array(items) => self.list_variations(items, num_needed),
            serde_json::Value::Object(entries) => self.map_variations(entries, num_needed),
            _ => Vec::new(),
        }
    }

    fn list_variations(
        &self,
        items: &[serde_json::Value],
        num_needed: usize,
    ) -> Vec<serde_json::Value> {
        if items.len() < 2 {
            return Vec::new();
        }

        let mut variations = Vec::new();
        let mut rng = self.rng.borrow_mut();
        for _ in 0..num_needed.min(3) {
            let mut permuted = items.to_vec();
            permuted.shuffle(&mut *rng);
            variations.push(serde_json::Value::Array(permuted));
        }
        return variations;
    }

    fn map_variations(
        &self,
        entries: &serde_json::Map<String, serde_json::Value>,
        num_needed: usize,
    ) -> Vec<serde_json::Value> {
        let mut variations = Vec::new();

        for (key, value) in entries {
            match value {
                serde_json::Value::Number(number) => {
                    let Some(value) = number.as_i64() else {
                        continue;
                    };
                    for variation in numeric_variations(value, num_needed, 1) {
                        let mut modified = entries.clone();
                        modified.insert(key.clone(), variation.into());
                        variations.push(serde_json::Value::Object(modified));
                    }
                }
                serde_json::Value::Array(items) => {
                    for variation in
                        self.list_variations(items, num_needed.saturating_sub(variations.len()))
                    {
                        let mut modified = entries.clone();
                        modified.insert(key.clone(), variation);
                        variations.push(serde_json::Value::Object(modified));
                    }
                }
                _ => {}
            }
        }

        variations.shuffle(&mut *self.rng.borrow_mut());
        variations.truncate(num_needed);
        return variations;
    }
}

impl DistractorStrategy for OutputModificationStrategy {
    fn generate(
        &self,
        correct_options: &[serde_json::Value],
        _context: &ExecutionContext,
        spec: &QuestionSpec,
        num_distractors: usize,
    ) -> Vec<serde_json::Value> {
        match spec.question_type {
            QuestionType::Mcq => match correct_options.first() {
                Some(correct_option) => {
                    self.generate_mcq_distractors(correct_option, num_distractors)
                }
                None => Vec::new(),
            },
            QuestionType::Mrq => self.generate_mrq_distractors(correct_options, num_distractors),
            QuestionType::ShortAnswer => Vec::new(),
        }
    }
}

impl Default for OutputModificationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearby integers ordered closest first, never crossing zero so a count
/// stays a plausible count.
fn numeric_variations(value: i64, num_needed: usize, max_variation: i64) -> Vec<i64> {
    let mut variations = Vec::new();
    let mut seen = vec![value];

    let mut add_variation = |candidate: i64, variations: &mut Vec<i64>| {
        if seen.contains(&candidate) {
            return;
        }
        if value < 0 && candidate >= 0 {
            return;
        }
        if value >= 0 && candidate < 0 {
            return;
        }
        variations.push(candidate);
        seen.push(candidate);
    };

    for diff in 1..=max_variation {
        add_variation(value - diff, &mut variations);
        add_variation(value + diff, &mut variations);
        if variations.len() >= num_needed {
            break;
        }
    }

    variations.truncate(num_needed);
    return variations;
}

fn add_distractor(
    distractors: &mut Vec<serde_json::Value>,
    seen: &mut Vec<String>,
    incoming: serde_json::Value,
) {
    let key = incoming.to_string();
    if !seen.contains(&key) {
        distractors.push(incoming);
        seen.push(key);
    }
}

#[cfg(test)]
mod tests {
    use crate::question::models::{OutputType, QuestionType, TargetElement, TargetElementType};

    use super::*;

    fn spec(question_type: QuestionType) -> QuestionSpec {
        QuestionSpec {
            target: vec![TargetElement::new(TargetElementType::Variable).with_name("x")],
            output_type: OutputType::Last,
            question_type,
        }
    }

    #[test]
    fn numeric_variations_should_stay_on_the_same_side_of_zero() {
        assert_eq!(numeric_variations(1, 4, 3), vec![0, 2, 3, 4]);
        assert_eq!(numeric_variations(-1, 4, 3), vec![-2, -3, -4]);
        assert_eq!(numeric_variations(0, 2, 3), vec![1, 2]);
    }

    #[test]
    fn mcq_distractors_should_vary_one_element_at_a_time() {
        let strategy = OutputModificationStrategy::with_seed(7);
        let correct = vec![serde_json::json!([15])];
        let distractors = strategy.generate(
            &correct,
            &ExecutionContext::new(),
            &spec(QuestionType::Mcq),
            3,
        );

        assert_eq!(distractors.len(), 3);
        for distractor in &distractors {
            let serde_json::Value::Array(items) = distractor else {
                panic!("expected array options");
            };
            assert_eq!(items.len(), 1);
            assert_ne!(distractor, &correct[0]);
        }
    }

    #[test]
    fn mrq_distractors_should_vary_whole_options() {
        let strategy = OutputModificationStrategy::with_seed(7);
        let correct = vec![serde_json::json!(3), serde_json::json!(6)];
        let distractors = strategy.generate(
            &correct,
            &ExecutionContext::new(),
            &spec(QuestionType::Mrq),
            4,
        );

        assert_eq!(distractors.len(), 4);
        for distractor in &distractors {
            assert!(!correct.contains(distractor));
        }
    }

    #[test]
    fn short_answer_questions_should_get_no_distractors() {
        let strategy = OutputModificationStrategy::with_seed(7);
        let distractors = strategy.generate(
            &[serde_json::json!(3)],
            &ExecutionContext::new(),
            &spec(QuestionType::ShortAnswer),
            4,
        );
        assert!(distractors.is_empty());
    }
}
