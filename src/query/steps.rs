use std::{cmp::Ordering, fmt::Debug, rc::Rc};

use crate::{errors::QueryEngineError, executor::values::Value};

use super::rows::{get_field_value, row_compare, JoinResult, Row};

pub type MapFn = Rc<dyn Fn(&Row) -> Row>;
pub type AggFn = Rc<dyn Fn(&[Row]) -> Row>;
pub type JoinPredicate = Rc<dyn Fn(&Row, &Row) -> bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CompareOp {
    fn parse(op: &str) -> Result<Self, QueryEngineError> {
        Ok(match op {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            other => return Err(QueryEngineError::invalid_operator(other)),
        })
    }
}

/// A single `where` condition. Field resolution failures and type mismatches
/// make the condition false rather than erroring, which keeps filters usable
/// over the heterogeneous trace relation.
#[derive(Clone)]
pub struct QueryCondition {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl QueryCondition {
    pub fn new(field: &str, op: &str, value: Value) -> Result<Self, QueryEngineError> {
        Ok(Self {
            field: field.to_owned(),
            op: CompareOp::parse(op)?,
            value,
        })
    }

    pub fn evaluate(&self, row: &Row) -> bool {
        let Ok(field_row) = get_field_value(row, &self.field) else {
            return false;
        };

        match self.op {
            CompareOp::Eq => row_equals_value(&field_row, &self.value),
            CompareOp::Ne => {
                // A field that resolved at all compares unequal when types differ.
                !row_equals_value(&field_row, &self.value)
            }
            CompareOp::Lt => compare_matches(&field_row, &self.value, Ordering::is_lt),
            CompareOp::Le => compare_matches(&field_row, &self.value, Ordering::is_le),
            CompareOp::Gt => compare_matches(&field_row, &self.value, Ordering::is_gt),
            CompareOp::Ge => compare_matches(&field_row, &self.value, Ordering::is_ge),
            CompareOp::In => match field_row.as_value() {
                Some(field_value) => self.value.contains(&field_value).unwrap_or(false),
                None => false,
            },
            CompareOp::NotIn => match field_row.as_value() {
                Some(field_value) => match self.value.contains(&field_value) {
                    Some(contained) => !contained,
                    None => false,
                },
                None => false,
            },
        }
    }
}

impl Debug for QueryCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QueryCondition({} {:?} {})", self.field, self.op, self.value)
    }
}

fn row_equals_value(row: &Row, value: &Value) -> bool {
    match row {
        Row::Value(row_value) => row_value == value,
        Row::Null => matches!(value, Value::Null),
        _ => false,
    }
}

fn compare_matches(row: &Row, value: &Value, matches: fn(Ordering) -> bool) -> bool {
    let Some(field_value) = row.as_value() else {
        return false;
    };
    field_value
        .compare(value)
        .map(matches)
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    FullOuter,
}

#[derive(Clone)]
pub struct JoinStep {
    pub kind: JoinKind,
    pub other: Vec<Row>,
    pub predicate: JoinPredicate,
    pub left_alias: String,
    pub right_alias: String,
}

/// One step of a pipeline. Steps are pure: `apply` consumes the rows of the
/// previous stage and produces the next.
#[derive(Clone)]
pub enum PipelineStep {
    Where(Vec<QueryCondition>),
    Select(Vec<String>),
    Map(MapFn),
    Reduce,
    Distinct,
    OrderBy { field: String, ascending: bool },
    GroupBy {
        fields: Vec<String>,
        aggregations: Vec<(String, AggFn)>,
    },
    Offset(usize),
    Limit(usize),
    Join(JoinStep),
}

impl Debug for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Where(conditions) => write!(f, "Where({conditions:?})"),
            Self::Select(fields) => write!(f, "Select({fields:?})"),
            Self::Map(_) => write!(f, "Map"),
            Self::Reduce => write!(f, "Reduce"),
            Self::Distinct => write!(f, "Distinct"),
            Self::OrderBy { field, ascending } => write!(f, "OrderBy({field}, {ascending})"),
            Self::GroupBy { fields, aggregations } => write!(
                f,
                "GroupBy({fields:?}, [{}])",
                aggregations
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Offset(offset) => write!(f, "Offset({offset})"),
            Self::Limit(limit) => write!(f, "Limit({limit})"),
            Self::Join(join) => write!(
                f,
                "Join({:?}, {} -> {})",
                join.kind, join.left_alias, join.right_alias
            ),
        }
    }
}

impl PipelineStep {
    pub fn apply(&self, items: Vec<Row>) -> Result<Vec<Row>, QueryEngineError> {
        match self {
            Self::Where(conditions) => Ok(items
                .into_iter()
                .filter(|item| conditions.iter().any(|condition| condition.evaluate(item)))
                .collect()),
            Self::Select(fields) => apply_select(fields, items),
            Self::Map(map) => Ok(items.iter().map(|item| map(item)).collect()),
            Self::Reduce => Ok(apply_reduce(items)),
            Self::Distinct => Ok(apply_distinct(items)),
            Self::OrderBy { field, ascending } => apply_order_by(field, *ascending, items),
            Self::GroupBy {
                fields,
                aggregations,
            } => apply_group_by(fields, aggregations, items),
            Self::Offset(offset) => Ok(items.into_iter().skip(*offset).collect()),
            Self::Limit(limit) => Ok(items.into_iter().take(*limit).collect()),
            Self::Join(join) => apply_join(join, items),
        }
    }
}

fn apply_select(fields: &[String], items: Vec<Row>) -> Result<Vec<Row>, QueryEngineError> {
    if fields.is_empty() {
        return Err("'select' requires at least one field.".into());
    }

    if let [field] = fields {
        return items
            .iter()
            .map(|item| get_field_value(item, field))
            .collect();
    }

    items
        .iter()
        .map(|item| {
            let entries = fields
                .iter()
                .map(|field| Ok((field.clone(), get_field_value(item, field)?)))
                .collect::<Result<Vec<_>, QueryEngineError>>()?;
            Ok(Row::Record(entries))
        })
        .collect()
}

fn apply_reduce(items: Vec<Row>) -> Vec<Row> {
    let mut reduced = Vec::new();
    for item in items {
        match item {
            Row::Value(Value::List(values)) => {
                reduced.extend(values.borrow().iter().cloned().map(Row::Value));
            }
            other => reduced.push(other),
        }
    }
    return reduced;
}

fn apply_distinct(items: Vec<Row>) -> Vec<Row> {
    // Rows are not hashable, so deduplication is an order-preserving
    // equality scan.
    let mut distinct: Vec<Row> = Vec::new();
    for item in items {
        if !distinct.contains(&item) {
            distinct.push(item);
        }
    }
    return distinct;
}

fn apply_order_by(
    field: &str,
    ascending: bool,
    items: Vec<Row>,
) -> Result<Vec<Row>, QueryEngineError> {
    let mut keyed = items
        .into_iter()
        .map(|item| Ok((get_field_value(&item, field)?, item)))
        .collect::<Result<Vec<_>, QueryEngineError>>()?;

    keyed.sort_by(|(left, _), (right, _)| {
        let ordering = row_compare(left, right).unwrap_or(Ordering::Equal);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });

    return Ok(keyed.into_iter().map(|(_, item)| item).collect());
}

fn apply_group_by(
    fields: &[String],
    aggregations: &[(String, AggFn)],
    items: Vec<Row>,
) -> Result<Vec<Row>, QueryEngineError> {
    if aggregations.is_empty() {
        return Err("At least one aggregation function must be specified for group_by.".into());
    }

    // Association list keyed by the tuple of key rows, in first-seen order.
    let mut groups: Vec<(Vec<Row>, Vec<Row>)> = Vec::new();
    if fields.is_empty() {
        groups.push((Vec::new(), items));
    } else {
        for item in items {
            let key = fields
                .iter()
                .map(|field| get_field_value(&item, field))
                .collect::<Result<Vec<_>, QueryEngineError>>()?;
            match groups.iter_mut().find(|(group_key, _)| *group_key == key) {
                Some((_, group)) => group.push(item),
                None => groups.push((key, vec![item])),
            }
        }
    }

    let mut aggregated = Vec::new();
    for (key, group) in groups {
        let mut entries: Vec<(String, Row)> = fields
            .iter()
            .cloned()
            .zip(key)
            .collect();
        for (name, aggregation) in aggregations {
            entries.push((name.clone(), aggregation(&group)));
        }
        aggregated.push(Row::Record(entries));
    }
    return Ok(aggregated);
}

fn apply_join(join: &JoinStep, items: Vec<Row>) -> Result<Vec<Row>, QueryEngineError> {
    let mut results = Vec::new();

    match join.kind {
        JoinKind::Inner => {
            for left in &items {
                for right in &join.other {
                    if (join.predicate)(left, right) {
                        results.push(joined_row(join, Some(left), Some(right))?);
                    }
                }
            }
        }
        JoinKind::Left => {
            for left in &items {
                let mut matched = false;
                for right in &join.other {
                    if (join.predicate)(left, right) {
                        results.push(joined_row(join, Some(left), Some(right))?);
                        matched = true;
                    }
                }
                if !matched {
                    results.push(joined_row(join, Some(left), None)?);
                }
            }
        }
        JoinKind::Right => {
            for right in &join.other {
                let mut matched = false;
                for left in &items {
                    if (join.predicate)(left, right) {
                        results.push(joined_row(join, Some(left), Some(right))?);
                        matched = true;
                    }
                }
                if !matched {
                    results.push(joined_row(join, None, Some(right))?);
                }
            }
        }
        JoinKind::FullOuter => {
            let mut matched_right = vec![false; join.other.len()];
            for left in &items {
                let mut matched = false;
                for (index, right) in join.other.iter().enumerate() {
                    if (join.predicate)(left, right) {
                        results.push(joined_row(join, Some(left), Some(right))?);
                        matched = true;
                        matched_right[index] = true;
                    }
                }
                if !matched {
                    results.push(joined_row(join, Some(left), None)?);
                }
            }
            for (index, right) in join.other.iter().enumerate() {
                if !matched_right[index] {
                    results.push(joined_row(join, None, Some(right))?);
                }
            }
        }
    }

    return Ok(results);
}

/// Builds one join-result row. A left side that is itself a join result is
/// flattened so aliases accumulate across chained joins.
fn joined_row(
    join: &JoinStep,
    left: Option<&Row>,
    right: Option<&Row>,
) -> Result<Row, QueryEngineError> {
    let mut result = JoinResult::default();

    match left {
        Some(Row::Join(existing)) => result.entries = existing.entries.clone(),
        other => result.add_alias(&join.left_alias, other.cloned())?,
    }
    result.add_alias(&join.right_alias, right.cloned())?;

    return Ok(Row::Join(result));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[i64]) -> Vec<Row> {
        values
            .iter()
            .map(|value| Row::Value(Value::Integer(*value)))
            .collect()
    }

    #[test]
    fn where_should_or_conditions_within_one_step() {
        let step = PipelineStep::Where(vec![
            QueryCondition::new("", "==", Value::Integer(1)).unwrap(),
            QueryCondition::new("", "==", Value::Integer(3)).unwrap(),
        ]);
        // An empty path resolves to the row itself.
        let result = step.apply(rows(&[1, 2, 3])).unwrap();
        assert_eq!(result, rows(&[1, 3]));
    }

    #[test]
    fn unknown_operator_should_fail_at_construction() {
        assert_eq!(
            QueryCondition::new("field", "~=", Value::Null).unwrap_err(),
            QueryEngineError::invalid_operator("~=")
        );
    }

    #[test]
    fn type_mismatched_comparison_should_be_false() {
        let condition = QueryCondition::new("", "<", Value::from("text")).unwrap();
        assert!(!condition.evaluate(&Row::Value(Value::Integer(1))));
    }

    #[test]
    fn in_should_check_membership_in_the_condition_value() {
        let condition =
            QueryCondition::new("", "in", Value::new_list(vec![1, 2])).unwrap();
        assert!(condition.evaluate(&Row::Value(Value::Integer(2))));
        assert!(!condition.evaluate(&Row::Value(Value::Integer(9))));

        let not_in = QueryCondition::new("", "not_in", Value::new_list(vec![1])).unwrap();
        assert!(not_in.evaluate(&Row::Value(Value::Integer(9))));
        // A non-container right side fails the condition rather than erroring.
        let malformed = QueryCondition::new("", "not_in", Value::Integer(1)).unwrap();
        assert!(!malformed.evaluate(&Row::Value(Value::Integer(9))));
    }

    #[test]
    fn reduce_should_flatten_one_level() {
        let items = vec![
            Row::Value(Value::new_list(vec![1, 2])),
            Row::Value(Value::Integer(3)),
        ];
        assert_eq!(PipelineStep::Reduce.apply(items).unwrap(), rows(&[1, 2, 3]));
    }

    #[test]
    fn distinct_should_preserve_first_occurrence_order() {
        let result = PipelineStep::Distinct.apply(rows(&[3, 1, 3, 2, 1])).unwrap();
        assert_eq!(result, rows(&[3, 1, 2]));
    }

    #[test]
    fn order_by_should_be_stable_for_equal_keys() {
        let items = vec![
            Row::Record(vec![
                ("k".to_owned(), Row::Value(Value::Integer(1))),
                ("tag".to_owned(), Row::Value(Value::from("first"))),
            ]),
            Row::Record(vec![
                ("k".to_owned(), Row::Value(Value::Integer(0))),
                ("tag".to_owned(), Row::Value(Value::from("second"))),
            ]),
            Row::Record(vec![
                ("k".to_owned(), Row::Value(Value::Integer(1))),
                ("tag".to_owned(), Row::Value(Value::from("third"))),
            ]),
        ];
        let step = PipelineStep::OrderBy {
            field: "k".to_owned(),
            ascending: true,
        };
        let result = step.apply(items).unwrap();
        let tags = result
            .iter()
            .map(|row| get_field_value(row, "tag").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            tags,
            vec![
                Row::Value(Value::from("second")),
                Row::Value(Value::from("first")),
                Row::Value(Value::from("third")),
            ]
        );
    }

    #[test]
    fn group_by_without_aggregation_should_fail() {
        let step = PipelineStep::GroupBy {
            fields: vec!["k".to_owned()],
            aggregations: Vec::new(),
        };
        assert!(step.apply(Vec::new()).is_err());
    }

    #[test]
    fn aggregation_without_group_fields_should_form_one_group() {
        let count: AggFn = Rc::new(|group| Row::Value(Value::Integer(group.len() as i64)));
        let step = PipelineStep::GroupBy {
            fields: Vec::new(),
            aggregations: vec![("count".to_owned(), count)],
        };
        let result = step.apply(rows(&[5, 6, 7])).unwrap();
        assert_eq!(
            result,
            vec![Row::Record(vec![(
                "count".to_owned(),
                Row::Value(Value::Integer(3))
            )])]
        );
    }

    #[test]
    fn left_join_should_keep_unmatched_left_rows() {
        let predicate: JoinPredicate = Rc::new(|left, right| {
            left.as_value().unwrap() == right.as_value().unwrap()
        });
        let step = PipelineStep::Join(JoinStep {
            kind: JoinKind::Left,
            other: rows(&[2]),
            predicate,
            left_alias: "0".to_owned(),
            right_alias: "1".to_owned(),
        });
        let result = step.apply(rows(&[1, 2])).unwrap();
        assert_eq!(result.len(), 2);

        let Row::Join(unmatched) = &result[0] else {
            panic!("expected join result");
        };
        assert_eq!(unmatched.get("1"), None);
        let Row::Join(matched) = &result[1] else {
            panic!("expected join result");
        };
        assert_eq!(matched.get("1"), Some(Row::Value(Value::Integer(2))));
    }

    #[test]
    fn full_outer_join_should_emit_both_unmatched_sides() {
        let predicate: JoinPredicate = Rc::new(|left, right| {
            left.as_value().unwrap() == right.as_value().unwrap()
        });
        let step = PipelineStep::Join(JoinStep {
            kind: JoinKind::FullOuter,
            other: rows(&[2, 9]),
            predicate,
            left_alias: "left".to_owned(),
            right_alias: "right".to_owned(),
        });
        let result = step.apply(rows(&[1, 2])).unwrap();
        // 1 unmatched left + 1 match + 1 unmatched right.
        assert_eq!(result.len(), 3);
    }
}
