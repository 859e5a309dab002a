use std::collections::BTreeMap;

use crate::hooks::HookRef;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Property {
    Value(Value),
    Hook(HookRef),
}

impl Property {
    pub fn as_hook(&self) -> Option<&HookRef> {
        match self {
            Property::Hook(hook) => Some(hook),
            Property::Value(_) => None,
        }
    }
}

/// An element under construction: what `create` returns and what the
/// attribute calls populate before `element` turns it into a node.
#[derive(Debug, Clone)]
pub struct ElementDescriptor<N> {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub class_name: Option<String>,
    pub style: Option<Value>,
    pub properties: BTreeMap<String, Property>,
    pub children: Vec<N>,
}

impl<N> ElementDescriptor<N> {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            attributes: BTreeMap::new(),
            class_name: None,
            style: None,
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn hook(&self, key: &str) -> Option<&HookRef> {
        self.properties.get(key).and_then(Property::as_hook)
    }
}
