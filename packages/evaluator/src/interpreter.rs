use std::cmp::Ordering;

use facade_runtime::{Map, Value};
use tracing::warn;

use crate::error::{EvalError, EvalResult};
use crate::expression::{BinaryOp, Expression, Statement, TemplatePart, UnaryOp};
use crate::scope::Scope;

pub fn evaluate(expression: &Expression, scope: &Scope) -> EvalResult<Value> {
    match expression {
        Expression::Number(n) => Ok(Value::Number(*n)),
        Expression::String(s) => Ok(Value::String(s.clone())),
        Expression::Boolean(b) => Ok(Value::Bool(*b)),
        Expression::Null => Ok(Value::Null),

        Expression::Template(parts) => {
            let mut text = String::new();
            for part in parts {
                match part {
                    TemplatePart::Text(literal) => text.push_str(literal),
                    TemplatePart::Expression(inner) => text.push_str(&evaluate(inner, scope)?.to_text()),
                }
            }
            Ok(Value::String(text))
        }

        Expression::Variable(name) => scope.get(name).cloned().ok_or_else(|| {
            warn!(variable_name = %name, "variable not found in scope");
            EvalError::UndefinedVariable { name: name.clone() }
        }),

        Expression::Member { object, property } => {
            let object = evaluate(object, scope)?;
            member(&object, property)
        }

        Expression::Index { object, index } => {
            let object = evaluate(object, scope)?;
            let index = evaluate(index, scope)?;
            match (&object, &index) {
                (Value::List(items), Value::Number(n)) => Ok(list_item(items, *n)),
                (Value::String(s), Value::Number(n)) => Ok(char_at(s, *n)),
                _ => member(&object, &index.to_text()),
            }
        }

        Expression::Call { callee, arguments } => {
            let Value::Function(function) = evaluate(callee, scope)? else {
                return Err(EvalError::type_error(format!("{} is not a function", describe(callee))));
            };
            let arguments = arguments
                .iter()
                .map(|argument| evaluate(argument, scope))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(function(&arguments))
        }

        Expression::Array(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<EvalResult<Vec<_>>>()
            .map(Value::List),

        Expression::Object(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), evaluate(value, scope)?);
            }
            Ok(Value::Map(map))
        }

        Expression::Unary { operator, operand } => {
            let operand = evaluate(operand, scope)?;
            Ok(match operator {
                UnaryOp::Not => Value::Bool(!operand.is_truthy()),
                UnaryOp::Negate => Value::Number(-to_number(&operand)),
                UnaryOp::Plus => Value::Number(to_number(&operand)),
            })
        }

        Expression::Binary { left, operator, right } => {
            let left = evaluate(left, scope)?;
            match operator {
                BinaryOp::And if !left.is_truthy() => Ok(left),
                BinaryOp::Or if left.is_truthy() => Ok(left),
                BinaryOp::Nullish if left != Value::Null => Ok(left),
                BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => evaluate(right, scope),
                _ => Ok(binary(*operator, &left, &evaluate(right, scope)?)),
            }
        }

        Expression::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if evaluate(test, scope)?.is_truthy() {
                evaluate(consequent, scope)
            } else {
                evaluate(alternate, scope)
            }
        }
    }
}

pub fn execute(statement: &Statement, scope: &mut Scope) -> EvalResult<()> {
    match statement {
        Statement::Declare { name, value } => {
            let value = match value {
                Some(value) => evaluate(value, scope)?,
                None => Value::Null,
            };
            scope.declare(name, value);
        }
        Statement::Assign { name, value } => {
            let value = evaluate(value, scope)?;
            scope.assign(name, value);
        }
        Statement::Expression(expression) => {
            evaluate(expression, scope)?;
        }
    }
    Ok(())
}

fn member(object: &Value, property: &str) -> EvalResult<Value> {
    match object {
        Value::Map(map) => Ok(map.get(property).cloned().unwrap_or(Value::Null)),
        Value::List(items) if property == "length" => Ok(Value::from(items.len())),
        Value::List(items) => Ok(property
            .parse::<f64>()
            .map(|index| list_item(items, index))
            .unwrap_or(Value::Null)),
        Value::String(s) if property == "length" => Ok(Value::from(s.chars().count())),
        Value::Null => Err(EvalError::type_error(format!(
            "Cannot read property '{}' of null",
            property
        ))),
        _ => Ok(Value::Null),
    }
}

/// Short source-like name for error messages.
fn describe(expression: &Expression) -> String {
    match expression {
        Expression::Variable(name) => name.clone(),
        Expression::Member { object, property } => format!("{}.{}", describe(object), property),
        Expression::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

fn list_item(items: &[Value], index: f64) -> Value {
    if index.fract() != 0.0 || index < 0.0 {
        return Value::Null;
    }
    items.get(index as usize).cloned().unwrap_or(Value::Null)
}

fn char_at(s: &str, index: f64) -> Value {
    if index.fract() != 0.0 || index < 0.0 {
        return Value::Null;
    }
    s.chars()
        .nth(index as usize)
        .map(|c| Value::String(c.to_string()))
        .unwrap_or(Value::Null)
}

pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn is_stringish(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::List(_) | Value::Map(_))
}

fn binary(operator: BinaryOp, left: &Value, right: &Value) -> Value {
    match operator {
        BinaryOp::Add if is_stringish(left) || is_stringish(right) => {
            Value::String(format!("{}{}", left.to_text(), right.to_text()))
        }
        BinaryOp::Add => Value::Number(to_number(left) + to_number(right)),
        BinaryOp::Subtract => Value::Number(to_number(left) - to_number(right)),
        BinaryOp::Multiply => Value::Number(to_number(left) * to_number(right)),
        BinaryOp::Divide => Value::Number(to_number(left) / to_number(right)),
        BinaryOp::Remainder => Value::Number(to_number(left) % to_number(right)),
        BinaryOp::Less => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::LessEqual => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Greater => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::GreaterEqual => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Equal => Value::Bool(loose_equal(left, right)),
        BinaryOp::NotEqual => Value::Bool(!loose_equal(left, right)),
        BinaryOp::StrictEqual => Value::Bool(left == right),
        BinaryOp::StrictNotEqual => Value::Bool(left != right),
        // Short-circuit operators are resolved before both sides are evaluated.
        BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => right.clone(),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    }
}

fn loose_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(_) | Value::Bool(_), Value::String(_) | Value::Bool(_) | Value::Number(_))
        | (Value::String(_), Value::Number(_) | Value::Bool(_)) => to_number(left) == to_number(right),
        _ => left == right,
    }
}
