use crate::{errors::QueryEngineError, executor::values::Value, trace::ExecutionContext};

pub mod rows;
pub mod steps;

pub use rows::{get_field_value, JoinResult, Row};
pub use steps::{AggFn, JoinKind, JoinPredicate, JoinStep, MapFn, PipelineStep, QueryCondition};

/// An immutable pipeline over the trace relation. Steps compose left to
/// right; `execute` folds them over the seed rows (the execution trace
/// followed by the variable snapshots).
#[derive(Debug, Clone)]
pub struct Query {
    seed: Vec<Row>,
    steps: Vec<PipelineStep>,
    bound_aliases: Vec<String>,
}

impl Query {
    pub fn new(context: &ExecutionContext) -> Self {
        let mut seed = context
            .execution_trace
            .iter()
            .map(|record| Row::Statement(record.clone()))
            .collect::<Vec<_>>();
        seed.extend(
            context
                .variables
                .iter()
                .map(|snapshot| Row::Variable(snapshot.clone())),
        );
        return Self::from_rows(seed);
    }

    pub fn from_rows(seed: Vec<Row>) -> Self {
        Self {
            seed,
            steps: Vec::new(),
            bound_aliases: Vec::new(),
        }
    }

    /// Keeps rows matching any of `conditions`; consecutive `where_any`
    /// steps AND together.
    pub fn where_any(mut self, conditions: Vec<QueryCondition>) -> Self {
        self.steps.push(PipelineStep::Where(conditions));
        return self;
    }

    /// Single-condition convenience for the common `field op value` filter.
    pub fn where_field(
        self,
        field: &str,
        op: &str,
        value: Value,
    ) -> Result<Self, QueryEngineError> {
        let condition = QueryCondition::new(field, op, value)?;
        return Ok(self.where_any(vec![condition]));
    }

    pub fn select(mut self, fields: &[&str]) -> Result<Self, QueryEngineError> {
        if fields.is_empty() {
            return Err("'select' requires at least one field.".into());
        }
        self.steps.push(PipelineStep::Select(
            fields.iter().map(|field| (*field).to_owned()).collect(),
        ));
        return Ok(self);
    }

    pub fn map(mut self, map: MapFn) -> Self {
        self.steps.push(PipelineStep::Map(map));
        return self;
    }

    pub fn reduce(mut self) -> Self {
        self.steps.push(PipelineStep::Reduce);
        return self;
    }

    pub fn distinct(mut self) -> Self {
        self.steps.push(PipelineStep::Distinct);
        return self;
    }

    pub fn order_by(mut self, field: &str, ascending: bool) -> Self {
        self.steps.push(PipelineStep::OrderBy {
            field: field.to_owned(),
            ascending,
        });
        return self;
    }

    /// Starts a grouped aggregation; attach aggregations with `agg`. A
    /// `group_by` that reaches `execute` without any aggregation is an
    /// error.
    pub fn group_by(mut self, fields: &[&str]) -> Self {
        self.steps.push(PipelineStep::GroupBy {
            fields: fields.iter().map(|field| (*field).to_owned()).collect(),
            aggregations: Vec::new(),
        });
        return self;
    }

    /// Adds an aggregation to the pending `group_by`, or groups all rows
    /// into a single group when there is none.
    pub fn agg(mut self, name: &str, aggregation: AggFn) -> Self {
        if let Some(PipelineStep::GroupBy { aggregations, .. }) = self.steps.last_mut() {
            aggregations.push((name.to_owned(), aggregation));
            return self;
        }
        self.steps.push(PipelineStep::GroupBy {
            fields: Vec::new(),
            aggregations: vec![(name.to_owned(), aggregation)],
        });
        return self;
    }

    pub fn offset(mut self, offset: i64) -> Result<Self, QueryEngineError> {
        if offset < 0 {
            return Err("'offset' must not be negative.".into());
        }
        self.steps.push(PipelineStep::Offset(offset as usize));
        return Ok(self);
    }

    pub fn limit(mut self, limit: i64) -> Result<Self, QueryEngineError> {
        if limit <= 0 {
            return Err("'limit' must be positive.".into());
        }
        self.steps.push(PipelineStep::Limit(limit as usize));
        return Ok(self);
    }

    pub fn inner_join(
        self,
        other: Vec<Row>,
        predicate: JoinPredicate,
        left_alias: &str,
        right_alias: &str,
    ) -> Result<Self, QueryEngineError> {
        self.join(JoinKind::Inner, other, predicate, left_alias, right_alias)
    }

    pub fn left_join(
        self,
        other: Vec<Row>,
        predicate: JoinPredicate,
        left_alias: &str,
        right_alias: &str,
    ) -> Result<Self, QueryEngineError> {
        self.join(JoinKind::Left, other, predicate, left_alias, right_alias)
    }

    pub fn right_join(
        self,
        other: Vec<Row>,
        predicate: JoinPredicate,
        left_alias: &str,
        right_alias: &str,
    ) -> Result<Self, QueryEngineError> {
        self.join(JoinKind::Right, other, predicate, left_alias, right_alias)
    }

    pub fn full_outer_join(
        self,
        other: Vec<Row>,
        predicate: JoinPredicate,
        left_alias: &str,
        right_alias: &str,
    ) -> Result<Self, QueryEngineError> {
        self.join(
            JoinKind::FullOuter,
            other,
            predicate,
            left_alias,
            right_alias,
        )
    }

    /// Alias bookkeeping happens here so a collision fails when the join is
    /// added, before any row is produced.
    fn join(
        mut self,
        kind: JoinKind,
        other: Vec<Row>,
        predicate: JoinPredicate,
        left_alias: &str,
        right_alias: &str,
    ) -> Result<Self, QueryEngineError> {
        if left_alias == right_alias {
            return Err("Left and right aliases must be different.".into());
        }
        if self.bound_aliases.iter().any(|alias| alias == right_alias) {
            return Err(format!("Alias '{right_alias}' is already used.").into());
        }

        if self.bound_aliases.is_empty() {
            self.bound_aliases.push(left_alias.to_owned());
        }
        self.bound_aliases.push(right_alias.to_owned());

        self.steps.push(PipelineStep::Join(JoinStep {
            kind,
            other,
            predicate,
            left_alias: left_alias.to_owned(),
            right_alias: right_alias.to_owned(),
        }));
        return Ok(self);
    }

    pub fn execute(&self) -> Result<Vec<Row>, QueryEngineError> {
        let mut items = self.seed.clone();
        for step in &self.steps {
            items = step.apply(items)?;
        }
        return Ok(items);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    fn value_rows(values: &[i64]) -> Vec<Row> {
        values
            .iter()
            .map(|value| Row::Value(Value::Integer(*value)))
            .collect()
    }

    #[test]
    fn sequential_where_steps_should_and_together() {
        let query = Query::from_rows(value_rows(&[1, 2, 3, 4]))
            .where_any(vec![
                QueryCondition::new("", ">", Value::Integer(1)).unwrap(),
                QueryCondition::new("", "==", Value::Integer(1)).unwrap(),
            ])
            .where_field("", "<", Value::Integer(4))
            .unwrap();
        // First step keeps 1..=3 (OR within the step), second keeps < 4.
        assert_eq!(query.execute().unwrap(), value_rows(&[1, 2, 3]));
    }

    #[test]
    fn offset_and_limit_should_validate_bounds() {
        assert!(Query::from_rows(Vec::new()).offset(-1).is_err());
        assert!(Query::from_rows(Vec::new()).limit(0).is_err());

        let query = Query::from_rows(value_rows(&[1, 2, 3, 4]))
            .offset(1)
            .unwrap()
            .limit(2)
            .unwrap();
        assert_eq!(query.execute().unwrap(), value_rows(&[2, 3]));
    }

    #[test]
    fn join_alias_collision_should_fail_before_execution() {
        let predicate: JoinPredicate = Rc::new(|_, _| true);
        let query = Query::from_rows(value_rows(&[1]))
            .left_join(value_rows(&[1]), predicate.clone(), "0", "1")
            .unwrap();
        let error = query
            .left_join(value_rows(&[1]), predicate, "1", "0")
            .unwrap_err();
        assert_eq!(
            error,
            QueryEngineError::Message("Alias '0' is already used.".to_owned())
        );
    }

    #[test]
    fn same_left_and_right_alias_should_fail() {
        let predicate: JoinPredicate = Rc::new(|_, _| true);
        assert!(Query::from_rows(Vec::new())
            .inner_join(Vec::new(), predicate, "a", "a")
            .is_err());
    }

    #[test]
    fn group_by_then_agg_should_attach_to_the_same_step() {
        let count: AggFn = Rc::new(|group| Row::Value(Value::Integer(group.len() as i64)));
        let query = Query::from_rows(value_rows(&[1, 1, 2]))
            .group_by(&[""])
            .agg("count", count)
            .select(&["count"])
            .unwrap();
        assert_eq!(query.execute().unwrap(), value_rows(&[2, 1]));
    }

    #[test]
    fn map_should_transform_each_row() {
        let query = Query::from_rows(value_rows(&[1, 2])).map(Rc::new(|row| {
            let Some(Value::Integer(value)) = row.as_value() else {
                return Row::Null;
            };
            Row::Value(Value::Integer(value * 10))
        }));
        assert_eq!(query.execute().unwrap(), value_rows(&[10, 20]));
    }
}
