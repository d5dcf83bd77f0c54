use std::{cmp::Ordering, fmt::Display, rc::Rc};

use crate::{
    errors::QueryEngineError,
    executor::values::Value,
    trace::{StatementKind, StatementRecord, StmtRef, VariableSnapshot},
};

/// One row of the queried relation. The seed relation is the union of
/// statement records and variable snapshots; joins, selects and aggregations
/// produce the other shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Statement(StmtRef),
    Variable(Rc<VariableSnapshot>),
    Join(JoinResult),
    Record(Vec<(String, Row)>),
    Value(Value),
    Null,
}

/// The result of one or more join steps: an alias-to-row mapping in alias
/// binding order. Outer joins leave `None` on the unmatched side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinResult {
    pub entries: Vec<(String, Option<Row>)>,
}

impl JoinResult {
    /// Rows for an alias. Missing aliases and outer-join nulls both read as
    /// `None`.
    pub fn get(&self, alias: &str) -> Option<Row> {
        self.entries
            .iter()
            .find(|(entry_alias, _)| entry_alias == alias)
            .and_then(|(_, row)| row.clone())
    }

    pub fn add_alias(&mut self, alias: &str, row: Option<Row>) -> Result<(), QueryEngineError> {
        if self.entries.iter().any(|(entry_alias, _)| entry_alias == alias) {
            return Err(format!("Alias '{alias}' is already used.").into());
        }
        self.entries.push((alias.to_owned(), row));
        return Ok(());
    }
}

impl Row {
    pub fn stmt_type(&self) -> Option<&'static str> {
        match self {
            Row::Statement(record) => Some(record.borrow().stmt_type()),
            Row::Variable(snapshot) => Some(snapshot.stmt_type()),
            _ => None,
        }
    }

    pub fn execution_id(&self) -> Option<i64> {
        match self {
            Row::Statement(record) => Some(record.borrow().execution_id),
            Row::Variable(snapshot) => Some(snapshot.execution_id),
            _ => None,
        }
    }

    pub fn end_execution_id(&self) -> Option<i64> {
        match self {
            Row::Statement(record) => record.borrow().end_execution_id,
            _ => None,
        }
    }

    pub fn line_number(&self) -> Option<usize> {
        match self {
            Row::Statement(record) => Some(record.borrow().line_number),
            Row::Variable(snapshot) => Some(snapshot.line_number),
            _ => None,
        }
    }

    /// The ordering key used by first/last aggregation: execution id plus
    /// variable id, with 0 for rows that have no variable id.
    pub fn ordering_key(&self) -> Option<(i64, i64)> {
        match self {
            Row::Statement(record) => Some((record.borrow().execution_id, 0)),
            Row::Variable(snapshot) => Some((snapshot.execution_id, snapshot.var_id)),
            _ => None,
        }
    }

    /// The "name" a target filter matches in nested-join predicates: the
    /// snapshot name for variables, the verbatim condition for branches, and
    /// the dotted callee for functions.
    pub fn filter_name(&self) -> Option<String> {
        match self {
            Row::Variable(snapshot) => Some(snapshot.name.clone()),
            Row::Statement(record) => match &record.borrow().kind {
                StatementKind::Branch { condition_str, .. } => Some(condition_str.clone()),
                StatementKind::FunctionCall { func_full_name, .. } => Some(func_full_name.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn loop_execution_id(&self) -> Option<i64> {
        match self {
            Row::Statement(record) => match &record.borrow().kind {
                StatementKind::LoopIteration {
                    loop_execution_id, ..
                } => Some(*loop_execution_id),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn condition_result(&self) -> Option<bool> {
        match self {
            Row::Statement(record) => match &record.borrow().kind {
                StatementKind::Branch {
                    condition_result, ..
                } => Some(*condition_result),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<Value> {
        match self {
            Row::Value(value) => Some(value.clone()),
            Row::Null => Some(Value::Null),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Row::Statement(record) => statement_to_json(&record.borrow()),
            Row::Variable(snapshot) => serde_json::json!({
                "var_id": snapshot.var_id,
                "name": snapshot.name,
                "value": snapshot.value.to_json(),
                "access_path": snapshot.access_path,
                "line_number": snapshot.line_number,
                "scope_id": snapshot.scope_id,
                "execution_id": snapshot.execution_id,
                "stmt_type": snapshot.stmt_type(),
            }),
            Row::Join(join) => serde_json::Value::Object(
                join.entries
                    .iter()
                    .map(|(alias, row)| {
                        (
                            alias.clone(),
                            row.as_ref()
                                .map(Row::to_json)
                                .unwrap_or(serde_json::Value::Null),
                        )
                    })
                    .collect(),
            ),
            Row::Record(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(name, row)| (name.clone(), row.to_json()))
                    .collect(),
            ),
            Row::Value(value) => value.to_json(),
            Row::Null => serde_json::Value::Null,
        }
    }
}

fn statement_to_json(record: &StatementRecord) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    object.insert("execution_id".to_owned(), record.execution_id.into());
    object.insert("scope_id".to_owned(), record.scope_id.into());
    object.insert("line_number".to_owned(), record.line_number.into());
    object.insert("stmt_type".to_owned(), record.stmt_type().into());
    object.insert(
        "end_execution_id".to_owned(),
        record
            .end_execution_id
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::Null),
    );

    match &record.kind {
        StatementKind::Loop {
            loop_type,
            num_iterations,
        } => {
            object.insert("loop_type".to_owned(), loop_type.as_str().into());
            object.insert("num_iterations".to_owned(), (*num_iterations).into());
        }
        StatementKind::LoopIteration {
            iteration_num,
            loop_execution_id,
        } => {
            object.insert("iteration_num".to_owned(), (*iteration_num).into());
            object.insert("loop_execution_id".to_owned(), (*loop_execution_id).into());
        }
        StatementKind::FunctionCall {
            func_name,
            func_full_name,
            func_def_line_num,
            arguments,
            return_value,
            func_call_exec_ctx_id,
        } => {
            object.insert("func_name".to_owned(), func_name.clone().into());
            object.insert("func_full_name".to_owned(), func_full_name.clone().into());
            object.insert(
                "func_def_line_num".to_owned(),
                func_def_line_num
                    .map(serde_json::Value::from)
                    .unwrap_or(serde_json::Value::Null),
            );
            object.insert(
                "arguments".to_owned(),
                serde_json::Value::Object(
                    arguments
                        .iter()
                        .map(|(name, value)| (name.clone(), value.to_json()))
                        .collect(),
                ),
            );
            object.insert("return_value".to_owned(), return_value.to_json());
            object.insert(
                "func_call_exec_ctx_id".to_owned(),
                (*func_call_exec_ctx_id).into(),
            );
        }
        StatementKind::Branch {
            condition_str,
            condition_result,
        } => {
            object.insert("condition_str".to_owned(), condition_str.clone().into());
            object.insert("condition_result".to_owned(), (*condition_result).into());
        }
    }

    return serde_json::Value::Object(object);
}

/// Resolves a dotted field path against a row: alias lookup on join rows,
/// record fields on statement records and snapshots, entry lookup on
/// mappings. Join nulls and missing aliases read as null; any other
/// unresolvable segment is an invalid field.
pub fn get_field_value(row: &Row, field_path: &str) -> Result<Row, QueryEngineError> {
    if field_path.is_empty() {
        return Ok(row.clone());
    }

    let mut current = row.clone();

    for field in field_path.split('.') {
        current = match &current {
            Row::Join(join) => match join.get(field) {
                Some(row) => row,
                None => return Ok(Row::Null),
            },
            Row::Statement(record) => statement_field(&record.borrow(), field)?,
            Row::Variable(snapshot) => variable_field(snapshot, field)?,
            Row::Record(entries) => entries
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, row)| row.clone())
                .ok_or_else(|| QueryEngineError::invalid_field(field))?,
            Row::Value(value) => value
                .get_entry(field)
                .map(Row::Value)
                .ok_or_else(|| QueryEngineError::invalid_field(field))?,
            Row::Null => return Err(QueryEngineError::invalid_field(field)),
        };
    }

    return Ok(current);
}

fn statement_field(record: &StatementRecord, field: &str) -> Result<Row, QueryEngineError> {
    let value = match field {
        "execution_id" => Value::Integer(record.execution_id),
        "scope_id" => Value::Integer(record.scope_id),
        "line_number" => Value::Integer(record.line_number as i64),
        "stmt_type" => Value::from(record.stmt_type()),
        "end_execution_id" => match record.end_execution_id {
            Some(end) => Value::Integer(end),
            None => return Ok(Row::Null),
        },
        _ => return statement_kind_field(record, field),
    };
    return Ok(Row::Value(value));
}

fn statement_kind_field(record: &StatementRecord, field: &str) -> Result<Row, QueryEngineError> {
    let value = match (&record.kind, field) {
        (StatementKind::Loop { loop_type, .. }, "loop_type") => Value::from(loop_type.as_str()),
        (StatementKind::Loop { num_iterations, .. }, "num_iterations") => {
            Value::Integer(*num_iterations as i64)
        }
        (StatementKind::LoopIteration { iteration_num, .. }, "iteration_num") => {
            Value::Integer(*iteration_num as i64)
        }
        (
            StatementKind::LoopIteration {
                loop_execution_id, ..
            },
            "loop_execution_id",
        ) => Value::Integer(*loop_execution_id),
        (StatementKind::FunctionCall { func_name, .. }, "func_name") => {
            Value::from(func_name.as_str())
        }
        (StatementKind::FunctionCall { func_full_name, .. }, "func_full_name") => {
            Value::from(func_full_name.as_str())
        }
        (
            StatementKind::FunctionCall {
                func_def_line_num, ..
            },
            "func_def_line_num",
        ) => match func_def_line_num {
            Some(line) => Value::Integer(*line as i64),
            None => return Ok(Row::Null),
        },
        (StatementKind::FunctionCall { arguments, .. }, "arguments") => {
            Value::new_map(arguments.iter().cloned())
        }
        (StatementKind::FunctionCall { return_value, .. }, "return_value") => return_value.clone(),
        (
            StatementKind::FunctionCall {
                func_call_exec_ctx_id,
                ..
            },
            "func_call_exec_ctx_id",
        ) => Value::Integer(*func_call_exec_ctx_id),
        (StatementKind::Branch { condition_str, .. }, "condition_str") => {
            Value::from(condition_str.as_str())
        }
        (
            StatementKind::Branch {
                condition_result, ..
            },
            "condition_result",
        ) => Value::Boolean(*condition_result),
        _ => return Err(QueryEngineError::invalid_field(field)),
    };
    return Ok(Row::Value(value));
}

fn variable_field(snapshot: &VariableSnapshot, field: &str) -> Result<Row, QueryEngineError> {
    let value = match field {
        "var_id" => Value::Integer(snapshot.var_id),
        "name" => Value::from(snapshot.name.as_str()),
        "value" => snapshot.value.clone(),
        "access_path" => Value::from(snapshot.access_path.as_str()),
        "line_number" => Value::Integer(snapshot.line_number as i64),
        "scope_id" => Value::Integer(snapshot.scope_id),
        "execution_id" => Value::Integer(snapshot.execution_id),
        "stmt_type" => Value::from(snapshot.stmt_type()),
        _ => return Err(QueryEngineError::invalid_field(field)),
    };
    return Ok(Row::Value(value));
}

/// Ordering between two resolved field values; rows that are not comparable
/// values sort as equal, keeping the surrounding sort stable.
pub fn row_compare(left: &Row, right: &Row) -> Option<Ordering> {
    match (left, right) {
        (Row::Value(left), Row::Value(right)) => left.compare(right),
        (Row::Null, Row::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Row::Statement(record) => {
                let record = record.borrow();
                write!(
                    f,
                    "{}(line={}, execution_id={})",
                    record.stmt_type(),
                    record.line_number,
                    record.execution_id
                )
            }
            Row::Variable(snapshot) => snapshot.value.fmt(f),
            Row::Join(join) => {
                f.write_str("{")?;
                let mut first = true;
                for (alias, row) in &join.entries {
                    if !first {
                        f.write_str(", ")?;
                    } else {
                        first = false;
                    }
                    match row {
                        Some(row) => write!(f, "\"{alias}\": {row}")?,
                        None => write!(f, "\"{alias}\": null")?,
                    }
                }
                f.write_str("}")
            }
            Row::Record(entries) => {
                f.write_str("{")?;
                let mut first = true;
                for (name, row) in entries {
                    if !first {
                        f.write_str(", ")?;
                    } else {
                        first = false;
                    }
                    write!(f, "\"{name}\": {row}")?;
                }
                f.write_str("}")
            }
            Row::Value(value) => value.fmt(f),
            Row::Null => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crate::trace::LoopType;

    use super::*;

    fn loop_row(execution_id: i64, end: i64, iterations: usize) -> Row {
        Row::Statement(Rc::new(RefCell::new(StatementRecord {
            execution_id,
            scope_id: 0,
            line_number: 1,
            end_execution_id: Some(end),
            kind: StatementKind::Loop {
                loop_type: LoopType::For,
                num_iterations: iterations,
            },
        })))
    }

    fn variable_row(var_id: i64, name: &str, value: Value) -> Row {
        Row::Variable(Rc::new(VariableSnapshot {
            var_id,
            name: name.to_owned(),
            value,
            access_path: name.to_owned(),
            line_number: 2,
            scope_id: 0,
            execution_id: 3,
        }))
    }

    #[test]
    fn should_resolve_statement_fields() {
        let row = loop_row(1, 4, 3);
        assert_eq!(
            get_field_value(&row, "stmt_type").unwrap(),
            Row::Value(Value::from("loop"))
        );
        assert_eq!(
            get_field_value(&row, "num_iterations").unwrap(),
            Row::Value(Value::Integer(3))
        );
        assert_eq!(
            get_field_value(&row, "end_execution_id").unwrap(),
            Row::Value(Value::Integer(4))
        );
    }

    #[test]
    fn should_fail_on_unknown_fields() {
        let row = loop_row(1, 4, 0);
        assert_eq!(
            get_field_value(&row, "condition_str"),
            Err(QueryEngineError::invalid_field("condition_str"))
        );
    }

    #[test]
    fn should_resolve_variable_value_entries_through_paths() {
        let row = variable_row(1, "m", Value::new_map([("k".to_owned(), Value::Integer(7))]));
        assert_eq!(
            get_field_value(&row, "value.k").unwrap(),
            Row::Value(Value::Integer(7))
        );
    }

    #[test]
    fn join_rows_should_resolve_aliases_and_tolerate_nulls() {
        let mut join = JoinResult::default();
        join.add_alias("0", Some(loop_row(1, 4, 2))).unwrap();
        join.add_alias("1", None).unwrap();
        let row = Row::Join(join);

        assert_eq!(
            get_field_value(&row, "0.execution_id").unwrap(),
            Row::Value(Value::Integer(1))
        );
        assert_eq!(get_field_value(&row, "1.execution_id").unwrap(), Row::Null);
        assert_eq!(get_field_value(&row, "missing.anything").unwrap(), Row::Null);
    }

    #[test]
    fn alias_reuse_should_fail() {
        let mut join = JoinResult::default();
        join.add_alias("0", None).unwrap();
        assert!(join.add_alias("0", None).is_err());
    }

    #[test]
    fn ordering_key_should_default_var_id_to_zero() {
        assert_eq!(loop_row(5, 6, 0).ordering_key(), Some((5, 0)));
        assert_eq!(
            variable_row(9, "x", Value::Integer(1)).ordering_key(),
            Some((3, 9))
        );
    }
}
