use crate::errors::ExecutionError;

use super::{values::Value, ExecutorContext};

pub fn call_builtin(
    name: &str,
    args: &[Value],
    context: &mut ExecutorContext,
) -> Result<Value, ExecutionError> {
    match (name, args) {
        ("range", [Value::Integer(stop)]) => range(0, *stop),
        ("range", [Value::Integer(start), Value::Integer(stop)]) => range(*start, *stop),
        ("len", [value]) => len(value),
        ("out", [value]) => out(context, value),
        ("abs", [Value::Integer(value)]) => Ok(Value::Integer(value.abs())),
        ("min", [Value::Integer(left), Value::Integer(right)]) => {
            Ok(Value::Integer(*left.min(right)))
        }
        ("max", [Value::Integer(left), Value::Integer(right)]) => {
            Ok(Value::Integer(*left.max(right)))
        }
        ("str", [Value::String(value)]) => Ok(Value::String(value.clone())),
        ("str", [value]) => Ok(Value::String(value.to_string())),
        (name, args) => {
            let args = args
                .iter()
                .map(|arg| format!("{arg}"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(
                format!("No function found with name: '{name}' and arguments: {args}").into(),
            );
        }
    }
}

pub fn call_builtin_instance(
    name: &str,
    instance: &Value,
    args: &[Value],
    _context: &mut ExecutorContext,
) -> Result<Value, ExecutionError> {
    match (name, instance, args) {
        ("push", Value::List(values), [value]) => {
            values.borrow_mut().push(value.clone());
            Ok(Value::Null)
        }
        ("pop", Value::List(values), []) => values
            .borrow_mut()
            .pop()
            .ok_or("Cannot pop from an empty list".into()),
        ("insert", Value::Map(_), [Value::String(key), value]) => {
            instance.set_entry(key, value.clone())?;
            Ok(Value::Null)
        }
        ("remove", Value::List(values), [Value::Integer(index)]) => {
            let mut values = values.borrow_mut();
            let index = usize::try_from(*index)
                .map_err(|_| "Index must be a non-negative integer")?;
            if index >= values.len() {
                return Err(format!(
                    "Index value must be less than list length, list has length {} and got index {}.",
                    values.len(),
                    index
                )
                .into());
            }
            Ok(values.remove(index))
        }
        ("remove", Value::Map(entries), [Value::String(key)]) => {
            let mut entries = entries.borrow_mut();
            let Some(position) = entries.iter().position(|(entry_key, _)| entry_key == key) else {
                return Err(format!("No entry named {key} in map").into());
            };
            Ok(entries.remove(position).1)
        }
        ("contains", instance, [value]) => instance
            .contains(value)
            .map(Value::Boolean)
            .ok_or(format!("Cannot check membership on a value of type {}", instance.type_name()).into()),
        ("keys", Value::Map(entries), []) => Ok(Value::new_list(
            entries
                .borrow()
                .iter()
                .map(|(key, _)| Value::String(key.clone()))
                .collect::<Vec<_>>(),
        )),
        ("values", Value::Map(entries), []) => Ok(Value::new_list(
            entries
                .borrow()
                .iter()
                .map(|(_, value)| value.clone())
                .collect::<Vec<_>>(),
        )),
        ("len", instance, []) => len(instance),
        (name, instance, args) => {
            let args = args
                .iter()
                .map(|arg| arg.type_name().to_owned())
                .collect::<Vec<_>>()
                .join(", ");
            let instance_type = instance.type_name();
            return Err(format!(
                "No function found with name: {name} on type {instance_type} that accepts arguments ({args})"
            )
            .into());
        }
    }
}

fn range(start: i64, stop: i64) -> Result<Value, ExecutionError> {
    Ok(Value::new_list((start..stop).collect::<Vec<_>>()))
}

fn len(value: &Value) -> Result<Value, ExecutionError> {
    match value {
        Value::List(values) => Ok(Value::Integer(values.borrow().len() as i64)),
        Value::Map(entries) => Ok(Value::Integer(entries.borrow().len() as i64)),
        Value::String(value) => Ok(Value::Integer(value.chars().count() as i64)),
        value => Err(format!("Cannot take the length of a value of type {}", value.type_name()).into()),
    }
}

fn out(context: &mut ExecutorContext, value: &Value) -> Result<Value, ExecutionError> {
    let line = match value {
        // Strings print without surrounding quotes.
        Value::String(value) => value.clone(),
        value => value.to_string(),
    };
    context.output.push(line);
    return Ok(Value::Null);
}
