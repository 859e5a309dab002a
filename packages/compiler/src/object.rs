//! Object literal source text for attribute, property and mixin arguments.

use facade_ast::KeyTree;

/// JSON-quoted key or tag name.
pub(crate) fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

fn render_entries<'a>(entries: impl Iterator<Item = (&'a str, String)>) -> String {
    let body: Vec<String> = entries
        .map(|(key, value)| format!("{}: {}", quote(key), value))
        .collect();
    format!("{{{}}}", body.join(", "))
}

/// Plain attributes: repeated names collect into a list, in order.
#[derive(Debug, Default)]
pub(crate) struct MultiValueObject {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiValueObject {
    pub fn push(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some((_, values)) => values.push(value.to_string()),
            None => self.entries.push((key.to_string(), vec![value.to_string()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `{"class": [a, b], "id": c}`. Single values are not wrapped.
    pub fn render(&self) -> String {
        render_entries(self.entries.iter().map(|(key, values)| {
            let value = match values.as_slice() {
                [single] => single.clone(),
                many => format!("[{}]", many.join(", ")),
            };
            (key.as_str(), value)
        }))
    }
}

/// Single-valued object where a later key replaces the earlier value but
/// keeps its position, as an object literal assignment would.
#[derive(Debug, Default)]
pub(crate) struct MergedObject {
    entries: Vec<(String, String)>,
}

impl MergedObject {
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        render_entries(
            self.entries
                .iter()
                .map(|(key, value)| (key.as_str(), value.clone())),
        )
    }
}

/// Nested object from unflattened property paths.
pub(crate) fn render_tree(entries: &[(String, KeyTree<String>)]) -> String {
    render_entries(entries.iter().map(|(key, tree)| {
        let value = match tree {
            KeyTree::Leaf(expression) => expression.clone(),
            KeyTree::Branch(children) => render_tree(children),
        };
        (key.as_str(), value)
    }))
}

/// `Object.assign(target, spread1, spread2)`
pub(crate) fn assign(target: &str, spreads: &[&str]) -> String {
    format!("Object.assign({}, {})", target, spreads.join(", "))
}
