use std::rc::Rc;

use crate::{
    errors::QueryEngineError,
    executor::values::Value,
    query::{AggFn, JoinPredicate, Query, Row},
    trace::ExecutionContext,
};

use super::models::{OutputType, TargetElement, TargetElementType, TargetModifier};

/// Compiles a target path plus output type into a pipeline over the trace
/// relation. The first element filters the seed rows; every further element
/// left-joins the relation against itself with a containment predicate, so
/// the query drills into the frames selected so far. Join aliases are the
/// running indices `"0"`, `"1"`, ...
pub struct QueryGenerator {
    items: Vec<Row>,
    join_idx: usize,
}

impl QueryGenerator {
    pub fn new(context: &ExecutionContext) -> Self {
        let mut items = context
            .execution_trace
            .iter()
            .map(|record| Row::Statement(record.clone()))
            .collect::<Vec<_>>();
        items.extend(
            context
                .variables
                .iter()
                .map(|snapshot| Row::Variable(snapshot.clone())),
        );
        return Self {
            items,
            join_idx: 0,
        };
    }

    pub fn generate(
        mut self,
        target: &[TargetElement],
        output_type: OutputType,
    ) -> Result<Query, QueryEngineError> {
        for element in target {
            element.validate()?;
        }

        let mut query = Query::from_rows(self.items.clone());
        for (index, element) in target.iter().enumerate() {
            query = if index == 0 {
                self.apply_base_target(query, element)?
            } else {
                self.apply_nested_target(query, element)?
            };
        }

        query = self.apply_output_type(query, output_type)?;
        query = self.clean_output(query, target, output_type)?;

        return Ok(query);
    }

    fn apply_base_target(
        &mut self,
        mut query: Query,
        target: &TargetElement,
    ) -> Result<Query, QueryEngineError> {
        query = query.where_field(
            "stmt_type",
            "==",
            Value::from(target.element_type.as_str()),
        )?;

        if let Some(name) = &target.name {
            let field = match target.element_type {
                TargetElementType::Branch => "condition_str",
                TargetElementType::Function => "func_full_name",
                _ => "name",
            };
            query = query.where_field(field, "==", Value::from(name.as_str()))?;
        }

        if let Some(line_number) = target.line_number {
            query = query.where_field("line_number", "==", Value::Integer(line_number as i64))?;
        }

        match target.modifier {
            Some(TargetModifier::Arguments) => query = query.select(&["arguments"])?,
            Some(TargetModifier::ReturnValue) => query = query.select(&["return_value"])?,
            Some(TargetModifier::BranchTrue) => {
                query = query.where_field("condition_result", "==", Value::Boolean(true))?;
            }
            Some(TargetModifier::BranchFalse) => {
                query = query.where_field("condition_result", "==", Value::Boolean(false))?;
            }
            Some(TargetModifier::LoopIterations) => {
                let predicate: JoinPredicate = Rc::new(|left, right| {
                    left.stmt_type() == Some("loop")
                        && right.stmt_type() == Some("loop_iteration")
                        && right.loop_execution_id() == left.execution_id()
                });
                query = query.left_join(
                    self.items.clone(),
                    predicate,
                    &self.join_idx.to_string(),
                    &(self.join_idx + 1).to_string(),
                )?;
                self.join_idx += 1;
            }
            None => {}
        }

        return Ok(query);
    }

    /// Nested elements left-join against the full relation: keep right rows
    /// of the requested type whose execution ids fall inside the frame
    /// currently selected on the left.
    fn apply_nested_target(
        &mut self,
        query: Query,
        target: &TargetElement,
    ) -> Result<Query, QueryEngineError> {
        let join_idx = self.join_idx;
        let target = target.clone();

        let predicate: JoinPredicate = Rc::new(move |left, right| {
            let left_exec = if join_idx > 0 {
                let Row::Join(join) = left else {
                    return false;
                };
                match join.get(&join_idx.to_string()) {
                    Some(row) => row,
                    None => return false,
                }
            } else {
                left.clone()
            };

            let expected_type = match target.modifier {
                Some(TargetModifier::LoopIterations) => "loop_iteration",
                _ => target.element_type.as_str(),
            };
            if right.stmt_type() != Some(expected_type) {
                return false;
            }

            if let Some(name) = &target.name {
                if right.filter_name().as_deref() != Some(name.as_str()) {
                    return false;
                }
            }

            if let Some(line_number) = target.line_number {
                if right.line_number() != Some(line_number) {
                    return false;
                }
            }

            // Containment: end_execution_id is an inclusive upper bound over
            // every nested execution. Variable snapshots carry the id of
            // their enclosing frame, so only the upper bound applies.
            let (Some(right_id), Some(left_end)) =
                (right.execution_id(), left_exec.end_execution_id())
            else {
                return false;
            };
            let time_range = match target.element_type {
                TargetElementType::Variable => right_id <= left_end,
                _ => match left_exec.execution_id() {
                    Some(left_id) => left_id <= right_id && right_id <= left_end,
                    None => false,
                },
            };
            if !time_range {
                return false;
            }

            if target.modifier == Some(TargetModifier::LoopIterations)
                && right.loop_execution_id() != left_exec.execution_id()
            {
                return false;
            }

            match target.modifier {
                Some(TargetModifier::BranchTrue) => right.condition_result() == Some(true),
                Some(TargetModifier::BranchFalse) => right.condition_result() == Some(false),
                _ => true,
            }
        });

        let query = query.left_join(
            self.items.clone(),
            predicate,
            &self.join_idx.to_string(),
            &(self.join_idx + 1).to_string(),
        )?;
        self.join_idx += 1;
        return Ok(query);
    }

    fn apply_output_type(
        &self,
        mut query: Query,
        output_type: OutputType,
    ) -> Result<Query, QueryEngineError> {
        match output_type {
            OutputType::List => Ok(query),
            OutputType::Count => {
                let final_alias = self.join_idx.to_string();
                let count: AggFn = if self.join_idx > 0 {
                    query = self.group_by_aliases(query);
                    Rc::new(move |group| {
                        let matched = group
                            .iter()
                            .filter(|row| match row {
                                Row::Join(join) => join.get(&final_alias).is_some(),
                                _ => false,
                            })
                            .count();
                        Row::Value(Value::Integer(matched as i64))
                    })
                } else {
                    Rc::new(|group| Row::Value(Value::Integer(group.len() as i64)))
                };
                Ok(query.agg("count", count).select(&["count"])?)
            }
            OutputType::First => self.apply_extremum(query, "first_item", true),
            OutputType::Last => self.apply_extremum(query, "last_item", false),
        }
    }

    /// First/last pick the extremum of the composite ordering key
    /// `(execution_id, var_id)`; rows without a key (null join sides) sort
    /// first.
    fn apply_extremum(
        &self,
        mut query: Query,
        name: &str,
        minimum: bool,
    ) -> Result<Query, QueryEngineError> {
        let final_alias = self.join_idx.to_string();
        let joined = self.join_idx > 0;
        if joined {
            query = self.group_by_aliases(query);
        }

        let key = move |row: &Row| -> (i64, i64) {
            let item = if joined {
                match row {
                    Row::Join(join) => join.get(&final_alias),
                    _ => None,
                }
            } else {
                Some(row.clone())
            };
            item.and_then(|item| item.ordering_key()).unwrap_or((-1, -1))
        };

        let extremum: AggFn = Rc::new(move |group| {
            let mut best: Option<(&Row, (i64, i64))> = None;
            for row in group {
                let row_key = key(row);
                let replace = match &best {
                    None => true,
                    Some((_, best_key)) => {
                        if minimum {
                            row_key < *best_key
                        } else {
                            row_key > *best_key
                        }
                    }
                };
                if replace {
                    best = Some((row, row_key));
                }
            }
            best.map(|(row, _)| row.clone()).unwrap_or(Row::Null)
        });

        return Ok(query.agg(name, extremum).select(&[name])?);
    }

    // Grouping keys address the join aliases selected so far, leaving out
    // the final alias being aggregated over.
    fn group_by_aliases(&self, query: Query) -> Query {
        let fields = (0..self.join_idx)
            .map(|alias| format!("{alias}.execution_id"))
            .collect::<Vec<_>>();
        let fields = fields.iter().map(String::as_str).collect::<Vec<_>>();
        return query.group_by(&fields);
    }

    /// When the innermost target is a variable, project down to its value
    /// (or name/value pairs when no name was specified), reaching through
    /// the trailing join alias when joins exist.
    fn clean_output(
        &self,
        query: Query,
        target: &[TargetElement],
        output_type: OutputType,
    ) -> Result<Query, QueryEngineError> {
        if output_type == OutputType::Count {
            return Ok(query);
        }

        let Some(last) = target.last() else {
            return Ok(query);
        };
        if last.element_type != TargetElementType::Variable {
            return Ok(query);
        }

        let prefix = if self.join_idx > 0 {
            format!("{}.", self.join_idx)
        } else {
            String::new()
        };

        let name_field = format!("{prefix}name");
        let value_field = format!("{prefix}value");
        if last.name.is_some() {
            return query.select(&[value_field.as_str()]);
        }
        return query.select(&[name_field.as_str(), value_field.as_str()]);
    }
}
