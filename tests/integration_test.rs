#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use quizgen::question::models::{
        ExecutionSpec, GenerationOptions, OutputType, QuestionSpec, QuestionType, TargetElement,
        TargetElementType, TargetModifier,
    };
    use quizgen::question::query_generator::QueryGenerator;
    use quizgen::question::QuestionGenerator;
    use quizgen::query::{JoinPredicate, Query, QueryCondition, Row};
    use quizgen::trace::{ExecutionContext, StatementKind};
    use quizgen::{EngineError, QueryEngineError, Value};

    fn trace(source: &str) -> ExecutionContext {
        quizgen::trace(source).unwrap().trace
    }

    fn run_target(
        context: &ExecutionContext,
        target: Vec<TargetElement>,
        output_type: OutputType,
    ) -> Vec<Row> {
        QueryGenerator::new(context)
            .generate(&target, output_type)
            .unwrap()
            .execute()
            .unwrap()
    }

    fn integers(values: &[i64]) -> Vec<Row> {
        values
            .iter()
            .map(|value| Row::Value(Value::Integer(*value)))
            .collect()
    }

    // Every closed frame brackets exactly the executions recorded while it
    // was open.
    #[test]
    fn frames_should_contain_all_nested_execution_ids() {
        let source = r#"
func scale(v, factor) {
    if v > 1 {
        return v * factor;
    }
    return v;
}

total = 0;
for v in [1, 2, 3] {
    total = total + scale(v, 10);
}
"#;
        let context = trace(source);
        assert!(!context.execution_trace.is_empty());

        for (position, record) in context.execution_trace.iter().enumerate() {
            let record = record.borrow();
            let end = record
                .end_execution_id
                .expect("every frame closes after the run");
            assert!(record.execution_id <= end);

            for later in &context.execution_trace[position + 1..] {
                let later = later.borrow();
                // Records opened inside the frame's id window must fall
                // inside it entirely.
                if later.execution_id <= end {
                    let later_end = later.end_execution_id.unwrap();
                    assert!(
                        later_end <= end,
                        "nested frame {} must close before its parent {}",
                        later.execution_id,
                        record.execution_id
                    );
                }
            }
        }

        // Execution ids are strictly increasing in trace order.
        let ids = context
            .execution_trace
            .iter()
            .map(|record| record.borrow().execution_id)
            .collect::<Vec<_>>();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn loop_iteration_counts_should_match_iteration_records() {
        let source =
            "n = 4;\nwhile n > 0 {\n  for i in range(n) {\n    x = i;\n  }\n  n -= 2;\n}\n";
        let context = trace(source);

        for record in &context.execution_trace {
            let record = record.borrow();
            let StatementKind::Loop { num_iterations, .. } = record.kind else {
                continue;
            };
            let recorded = context
                .execution_trace
                .iter()
                .filter(|candidate| {
                    matches!(
                        candidate.borrow().kind,
                        StatementKind::LoopIteration { loop_execution_id, .. }
                            if loop_execution_id == record.execution_id
                    )
                })
                .count();
            assert_eq!(num_iterations, recorded);
        }
    }

    #[test]
    fn function_calls_should_open_and_close_their_own_scope() {
        let source = "func f(a) {\n  b = a + 1;\n  return b;\n}\nf(1);\nz = 2;\n";
        let context = trace(source);

        let call = context
            .execution_trace
            .iter()
            .find(|record| record.borrow().is_function_call())
            .unwrap()
            .borrow()
            .clone();
        let call_end = call.end_execution_id.unwrap();

        // The function scope is a child of the global scope.
        let function_scopes = context
            .scopes
            .iter()
            .filter(|scope| scope.parent == Some(0))
            .collect::<Vec<_>>();
        assert_eq!(function_scopes.len(), 1);
        let function_scope = function_scopes[0].scope_id;

        // Snapshots in the function scope happen only while the frame is
        // open; afterwards recording continues in the global scope.
        for snapshot in &context.variables {
            if snapshot.scope_id == function_scope {
                assert!(snapshot.execution_id >= call.execution_id);
                assert!(snapshot.execution_id <= call_end);
            }
        }
        let last = context.variables.last().unwrap();
        assert_eq!(last.name, "z");
        assert_eq!(last.scope_id, 0);
    }

    #[test]
    fn snapshots_should_not_reflect_later_mutation() {
        let source = "xs = [1, 2];\nxs[0] = 9;\n";
        let context = trace(source);

        let first = &context.variables[0];
        assert_eq!(first.name, "xs");
        assert_eq!(first.value, Value::new_list(vec![1, 2]));

        let second = &context.variables[1];
        assert_eq!(second.access_path, "xs[0]");
        assert_eq!(second.value, Value::new_list(vec![9, 2]));
    }

    #[test]
    fn distinct_should_be_a_prefix_preserving_subsequence() {
        let rows = integers(&[5, 3, 5, 1, 3, 5]);
        let result = Query::from_rows(rows).distinct().execute().unwrap();
        assert_eq!(result, integers(&[5, 3, 1]));
    }

    #[test]
    fn group_by_with_aggregation_should_be_idempotent() {
        let context = trace("for i in range(3) {\n  x = i;\n}\n");
        let target = vec![TargetElement::new(TargetElementType::Loop)
            .with_line_number(1)
            .with_modifier(TargetModifier::LoopIterations)];

        let query = QueryGenerator::new(&context)
            .generate(&target, OutputType::Count)
            .unwrap();
        assert_eq!(query.execute().unwrap(), query.execute().unwrap());
    }

    #[test]
    fn reduce_of_singleton_lists_should_be_identity() {
        let rows = integers(&[1, 2, 3]);
        let result = Query::from_rows(rows.clone())
            .map(Rc::new(|row| {
                Row::Value(Value::new_list([row.as_value().unwrap()]))
            }))
            .reduce()
            .execute()
            .unwrap();
        assert_eq!(result, rows);
    }

    #[test]
    fn join_result_sizes_should_satisfy_the_join_bounds() {
        let left = integers(&[1, 2, 2, 3]);
        let right = integers(&[2, 2, 4]);
        let predicate: JoinPredicate = Rc::new(|left, right| left.as_value() == right.as_value());

        let inner = Query::from_rows(left.clone())
            .inner_join(right.clone(), predicate.clone(), "l", "r")
            .unwrap()
            .execute()
            .unwrap();
        // Two left 2s each match two right 2s.
        assert_eq!(inner.len(), 4);

        let left_join = Query::from_rows(left.clone())
            .left_join(right.clone(), predicate.clone(), "l", "r")
            .unwrap()
            .execute()
            .unwrap();
        assert!(left_join.len() >= left.len());

        let full = Query::from_rows(left.clone())
            .full_outer_join(right.clone(), predicate, "l", "r")
            .unwrap()
            .execute()
            .unwrap();
        assert!(full.len() >= left.len().max(right.len()));
    }

    #[test]
    fn where_conditions_should_or_within_a_step_and_and_across_steps() {
        let rows = integers(&[1, 2, 3, 4, 5]);
        let result = Query::from_rows(rows)
            .where_any(vec![
                QueryCondition::new("", "==", Value::Integer(2)).unwrap(),
                QueryCondition::new("", ">=", Value::Integer(4)).unwrap(),
            ])
            .where_field("", "!=", Value::Integer(5))
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(result, integers(&[2, 4]));
    }

    // E1: counting `for` iterations.
    #[test]
    fn e1_should_count_for_loop_and_its_iterations() {
        let source = "for i in range(3) {\n  x = i * 2;\n}\n";
        let context = trace(source);

        let loops = context
            .execution_trace
            .iter()
            .filter_map(|record| match record.borrow().kind {
                StatementKind::Loop {
                    loop_type,
                    num_iterations,
                } => Some((loop_type.as_str().to_owned(), num_iterations)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(loops, vec![("for".to_owned(), 3)]);

        let iteration_numbers = context
            .execution_trace
            .iter()
            .filter_map(|record| match record.borrow().kind {
                StatementKind::LoopIteration { iteration_num, .. } => Some(iteration_num),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(iteration_numbers, vec![0, 1, 2]);

        let x_values = context
            .variables
            .iter()
            .filter(|snapshot| snapshot.name == "x")
            .map(|snapshot| snapshot.value.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            x_values,
            vec![Value::Integer(0), Value::Integer(2), Value::Integer(4)]
        );

        let counts = run_target(
            &context,
            vec![TargetElement::new(TargetElementType::Loop).with_line_number(1)],
            OutputType::Count,
        );
        assert_eq!(counts, integers(&[1]));

        let iteration_counts = run_target(
            &context,
            vec![TargetElement::new(TargetElementType::Loop)
                .with_line_number(1)
                .with_modifier(TargetModifier::LoopIterations)],
            OutputType::Count,
        );
        assert_eq!(iteration_counts, integers(&[3]));
    }

    // E2: `while` with mutation.
    #[test]
    fn e2_should_trace_while_loop_totals() {
        let source = "sum = 0;\nnum = 5;\nwhile num > 0 {\n  sum += num;\n  num -= 1;\n}\n";
        let context = trace(source);

        let loops = context
            .execution_trace
            .iter()
            .filter_map(|record| match record.borrow().kind {
                StatementKind::Loop {
                    loop_type,
                    num_iterations,
                } => Some((loop_type.as_str().to_owned(), num_iterations)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(loops, vec![("while".to_owned(), 5)]);

        let result = run_target(
            &context,
            vec![TargetElement::new(TargetElementType::Variable).with_name("sum")],
            OutputType::Last,
        );
        assert_eq!(result, integers(&[15]));

        let result = run_target(
            &context,
            vec![TargetElement::new(TargetElementType::Variable).with_name("num")],
            OutputType::Last,
        );
        assert_eq!(result, integers(&[0]));
    }

    // E3: function call arguments and return value.
    #[test]
    fn e3_should_record_call_arguments_and_return_value() {
        let source = "func f(a, b) {\n  return a + b;\n}\nf(3, 4);\n";
        let context = trace(source);

        let call = context
            .execution_trace
            .iter()
            .find(|record| record.borrow().is_function_call())
            .unwrap()
            .borrow()
            .clone();
        let StatementKind::FunctionCall {
            func_name,
            func_full_name,
            arguments,
            return_value,
            ..
        } = call.kind
        else {
            panic!("expected function call");
        };
        assert_eq!(func_name, "f");
        assert_eq!(func_full_name, "f");
        assert_eq!(
            arguments,
            vec![
                ("_arg0".to_owned(), Value::Integer(3)),
                ("_arg1".to_owned(), Value::Integer(4)),
            ]
        );
        assert_eq!(return_value, Value::Integer(7));

        let arguments = run_target(
            &context,
            vec![TargetElement::new(TargetElementType::Function)
                .with_name("f")
                .with_modifier(TargetModifier::Arguments)],
            OutputType::List,
        );
        assert_eq!(
            arguments,
            vec![Row::Value(Value::new_map([
                ("_arg0".to_owned(), Value::Integer(3)),
                ("_arg1".to_owned(), Value::Integer(4)),
            ]))]
        );

        let returns = run_target(
            &context,
            vec![TargetElement::new(TargetElementType::Function)
                .with_name("f")
                .with_modifier(TargetModifier::ReturnValue)],
            OutputType::List,
        );
        assert_eq!(returns, integers(&[7]));
    }

    // E4: branch polarity.
    #[test]
    fn e4_should_record_branch_condition_and_polarity() {
        let source = "x = 5;\nif x > 0 {\n  y = 1;\n} else {\n  y = 0 - 1;\n}\n";
        let context = trace(source);

        let branches = context
            .execution_trace
            .iter()
            .filter_map(|record| match &record.borrow().kind {
                StatementKind::Branch {
                    condition_str,
                    condition_result,
                } => Some((condition_str.clone(), *condition_result)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(branches, vec![("x > 0".to_owned(), true)]);

        let taken = run_target(
            &context,
            vec![TargetElement::new(TargetElementType::Branch)
                .with_modifier(TargetModifier::BranchTrue)],
            OutputType::Count,
        );
        assert_eq!(taken, integers(&[1]));

        let skipped = run_target(
            &context,
            vec![TargetElement::new(TargetElementType::Branch)
                .with_modifier(TargetModifier::BranchFalse)],
            OutputType::Count,
        );
        assert_eq!(skipped, integers(&[0]));
    }

    // E5: nested containment.
    #[test]
    fn e5_should_scope_variable_values_to_the_enclosing_loop() {
        let source = "for i in range(3) {\n  x = i * 2;\n}\n";
        let context = trace(source);

        let loop_record = context
            .execution_trace
            .iter()
            .find(|record| matches!(record.borrow().kind, StatementKind::Loop { .. }))
            .unwrap()
            .borrow()
            .clone();
        let loop_end = loop_record.end_execution_id.unwrap();
        for snapshot in context.variables.iter().filter(|s| s.name == "x") {
            assert!(loop_record.execution_id <= snapshot.execution_id);
            assert!(snapshot.execution_id <= loop_end);
        }

        let values = run_target(
            &context,
            vec![
                TargetElement::new(TargetElementType::Loop).with_line_number(1),
                TargetElement::new(TargetElementType::Variable).with_name("x"),
            ],
            OutputType::List,
        );
        assert_eq!(values, integers(&[0, 2, 4]));
    }

    // E6: join alias collision fails before any row is produced.
    #[test]
    fn e6_should_reject_alias_collisions_at_construction() {
        let predicate: JoinPredicate = Rc::new(|_, _| true);
        let query = Query::from_rows(integers(&[1]))
            .left_join(integers(&[1]), predicate.clone(), "0", "1")
            .unwrap();

        let error = query
            .left_join(integers(&[1]), predicate, "2", "1")
            .unwrap_err();
        assert_eq!(
            error,
            QueryEngineError::Message("Alias '1' is already used.".to_owned())
        );
    }

    #[test]
    fn invalid_source_should_surface_as_a_parser_error() {
        let error = quizgen::trace("x = ;").unwrap_err();
        assert!(matches!(
            error,
            EngineError::ParserError(_) | EngineError::LexerError(_)
        ));
    }

    #[test]
    fn generated_questions_should_carry_consistent_options() {
        let code = "func classify(values) {\n  hits = 0;\n  for v in values {\n    if v > 10 {\n      hits += 1;\n    }\n  }\n  return hits;\n}\n";
        let mut test_data = serde_json::Map::new();
        test_data.insert("values".to_owned(), serde_json::json!([4, 11, 25]));

        let question = QuestionGenerator::with_seed(11)
            .generate_question(
                code,
                &QuestionSpec {
                    target: vec![
                        TargetElement::new(TargetElementType::Variable).with_name("hits")
                    ],
                    output_type: OutputType::Last,
                    question_type: QuestionType::Mcq,
                },
                &ExecutionSpec {
                    entry_function: "classify".to_owned(),
                    test_data,
                },
                &GenerationOptions::default(),
            )
            .unwrap();

        assert_eq!(question.answer, "[2]");
        let options = question.options.unwrap();
        let correct_indices = question.correct_indices.unwrap();
        assert_eq!(options[correct_indices[0]], serde_json::json!([2]));
        // Every option is distinct.
        for (position, option) in options.iter().enumerate() {
            assert_eq!(
                options.iter().position(|other| other == option),
                Some(position)
            );
        }
    }

    #[test]
    fn analysis_should_expose_the_lexical_structure_for_forms() {
        let code = "func total(values) {\n  sum = 0;\n  for v in values {\n    sum = sum + v;\n  }\n  return sum;\n}\n";
        let analysis = quizgen::analyse(code).unwrap();
        assert_eq!(analysis.functions.len(), 1);
        assert_eq!(analysis.loops.len(), 1);
        assert!(analysis.variables.contains(&"sum".to_owned()));

        let schema = quizgen::api::analyse_code(&quizgen::api::AnalyseCodeRequest {
            code: code.to_owned(),
        })
        .unwrap();
        assert_eq!(schema.code_info.functions.len(), 1);
        assert_eq!(schema.form_elements.len(), 3);
    }
}
