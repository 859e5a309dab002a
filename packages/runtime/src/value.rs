use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::hooks::HookRef;

/// Object entries in insertion order.
pub type Map = IndexMap<String, Value>;

/// Callable exposed to template expressions.
pub type Function = Rc<dyn Fn(&[Value]) -> Value>;

/// Dynamic value flowing through the runtime entry points.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
    /// Value with hook capability; installed instead of stringified.
    Hook(HookRef),
    Function(Function),
    /// Prebuilt backend node, emitted by `text` as is.
    Node(Rc<dyn Any>),
}

impl Value {
    pub fn function(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Value::Function(Rc::new(f))
    }

    pub fn node<N: Any>(node: N) -> Self {
        Value::Node(Rc::new(node))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) | Value::Hook(_) | Value::Function(_) | Value::Node(_) => true,
        }
    }

    /// `null` and `false` attributes are never rendered.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_hook(&self) -> Option<&HookRef> {
        match self {
            Value::Hook(hook) => Some(hook),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "array",
            Value::Map(_) | Value::Node(_) => "object",
            Value::Hook(_) => "hook",
            Value::Function(_) => "function",
        }
    }

    /// String coercion with script semantics (`1` not `1.0`, lists joined
    /// by commas, nulls inside lists empty).
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => other.to_text(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) | Value::Hook(_) | Value::Node(_) => "[object Object]".to_string(),
            Value::Function(_) => "function".to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Hook(hook) => write!(f, "Hook({:?})", hook),
            Value::Function(_) => f.write_str("Function"),
            Value::Node(_) => f.write_str("Node"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Hook(a), Value::Hook(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Node(a), Value::Node(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<HookRef> for Value {
    fn from(hook: HookRef) -> Self {
        Value::Hook(hook)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Map(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::List(vec![]).is_truthy());
        assert!(!Value::from(f64::NAN).is_truthy());
    }

    #[test]
    fn test_absent() {
        assert!(Value::Null.is_absent());
        assert!(Value::from(false).is_absent());
        assert!(!Value::from(0.0).is_absent());
        assert!(!Value::from("").is_absent());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::from(1.0).to_text(), "1");
        assert_eq!(Value::from(-0.0).to_text(), "0");
        assert_eq!(Value::from(2.5).to_text(), "2.5");
        assert_eq!(Value::from(true).to_text(), "true");
        assert_eq!(
            Value::List(vec![1i64.into(), Value::Null, "x".into()]).to_text(),
            "1,,x"
        );
        assert_eq!(Value::Map(Map::new()).to_text(), "[object Object]");
    }

    #[test]
    fn test_large_integers_to_text() {
        assert_eq!(Value::from(1e20).to_text(), "100000000000000000000");
        assert_eq!(Value::from(-1e20).to_text(), "-100000000000000000000");
        assert_eq!(Value::from(9007199254740993.0).to_text(), "9007199254740992");
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({ "a": [1, "b", null], "c": true }));
        let map = value.as_map().unwrap();
        assert_eq!(
            map["a"],
            Value::List(vec![1i64.into(), "b".into(), Value::Null])
        );
        assert_eq!(map["c"], Value::Bool(true));
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let value = Value::from(json!({ "zeta": 1, "alpha": 2, "mid": 3 }));
        let keys: Vec<&str> = value.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_function_and_node_values() {
        let double = Value::function(|args| match args.first() {
            Some(Value::Number(n)) => Value::Number(n * 2.0),
            _ => Value::Null,
        });
        let Value::Function(f) = &double else { panic!("expected function") };
        assert_eq!(f(&[Value::from(4.0)]), Value::from(8.0));
        assert_eq!(double.type_name(), "function");
        assert_eq!(double, double.clone());

        let node = Value::node(String::from("prebuilt"));
        assert!(node.is_truthy());
        assert_eq!(node.type_name(), "object");
        assert_ne!(node, Value::node(String::from("prebuilt")));
    }
}
