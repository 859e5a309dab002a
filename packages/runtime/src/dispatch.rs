//! Routes attribute objects onto an element descriptor: plain attributes,
//! DOM properties, listeners, user hooks and handles.

use std::rc::Rc;

use crate::descriptor::{ElementDescriptor, Property};
use crate::dom::{Listener, Owner};
use crate::hooks::{EventHook, FunctionHook, HandleHook, HandleTarget, HookRef, PropertyHook, Subscriber};
use crate::value::{Map, Value};

/// Property slot holding the element's [`EventHook`].
pub const EVENTS_KEY: &str = "events";
/// Property slot holding the element's [`HandleHook`].
pub const HANDLE_KEY: &str = "handle";

/// Entry for [`hooks`]: a subscriber wrapped into a [`FunctionHook`], or a
/// value assigned as is.
pub enum HookInput {
    Subscribe(Subscriber),
    Value(Value),
}

/// Class string from a class value. Maps contribute their truthy keys, lists
/// their truthy members, anything else its string form.
pub fn class_string(value: &Value) -> String {
    match value {
        Value::Map(map) => map
            .iter()
            .filter(|(_, on)| on.is_truthy())
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        Value::List(items) => items
            .iter()
            .filter(|item| item.is_truthy())
            .map(class_string)
            .filter(|class| !class.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        other if !other.is_truthy() => String::new(),
        other => other.to_text(),
    }
}

pub fn attrs<N>(context: &mut ElementDescriptor<N>, mut values: Map) {
    if matches!(values.get("style"), Some(Value::Map(_))) {
        context.style = values.shift_remove("style");
    }

    if let Some(class) = values.get_mut("class") {
        if class.is_truthy() {
            *class = Value::String(class_string(class));
        }
    }

    for (name, value) in values {
        if value.is_absent() {
            continue;
        }

        match value {
            Value::String(class) if name == "class" && class.is_empty() => {}
            Value::Hook(hook) => {
                context.properties.insert(name, Property::Hook(hook));
            }
            other => {
                context.attributes.insert(name, other.to_text());
            }
        }
    }
}

pub fn props<N>(context: &mut ElementDescriptor<N>, values: Map) {
    for (key, value) in values {
        match key.as_str() {
            "class" => {
                let class = class_string(&value);
                if class.is_empty() {
                    continue;
                }

                let mut parts = Vec::new();
                if let Some(attribute) = context.attributes.remove("class") {
                    parts.push(attribute);
                }
                parts.push(class);
                if let Some(existing) = context.class_name.take() {
                    parts.push(existing);
                }
                parts.retain(|part| !part.is_empty());
                context.class_name = Some(parts.join(" "));
            }
            "style" => context.style = Some(value),
            _ => {
                let hook: HookRef = Rc::new(PropertyHook::new(value));
                context.properties.insert(key, Property::Hook(hook));
            }
        }
    }
}

pub fn events<N>(context: &mut ElementDescriptor<N>, owner: Option<Owner>, pairs: Vec<(String, Listener)>) {
    let hook: HookRef = Rc::new(EventHook::new(pairs).with_owner(owner));
    context
        .properties
        .insert(EVENTS_KEY.to_string(), Property::Hook(hook));
}

pub fn hooks<N>(context: &mut ElementDescriptor<N>, entries: Vec<(String, HookInput)>) {
    for (key, input) in entries {
        let property = match input {
            HookInput::Subscribe(subscriber) => Property::Hook(Rc::new(FunctionHook::new(Some(subscriber)))),
            HookInput::Value(value) => Property::Value(value),
        };
        context.properties.insert(key, property);
    }
}

pub fn handles<N>(context: &mut ElementDescriptor<N>, target: HandleTarget, names: Vec<String>) {
    let hook: HookRef = Rc::new(HandleHook::new(target, names));
    context
        .properties
        .insert(HANDLE_KEY.to_string(), Property::Hook(hook));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::subscriber;
    use serde_json::json;

    type Descriptor = ElementDescriptor<()>;

    fn map(json: serde_json::Value) -> Map {
        match Value::from(json) {
            Value::Map(map) => map,
            other => panic!("expected an object, got {:?}", other),
        }
    }

    #[test]
    fn test_class_string() {
        assert_eq!(class_string(&"a b".into()), "a b");
        assert_eq!(
            class_string(&Value::from(json!({ "on": true, "off": false, "yes": 1 }))),
            "on yes"
        );
        assert_eq!(
            class_string(&Value::from(json!(["a", null, { "b": true }, ""]))),
            "a b"
        );
        assert_eq!(class_string(&Value::Null), "");
    }

    #[test]
    fn test_attrs_stringifies_and_drops_absent() {
        let mut el = Descriptor::new("input");
        attrs(
            &mut el,
            map(json!({ "id": "name", "tabindex": 2, "disabled": false, "title": null, "required": true })),
        );
        assert_eq!(el.attributes.get("id").map(String::as_str), Some("name"));
        assert_eq!(el.attributes.get("tabindex").map(String::as_str), Some("2"));
        assert_eq!(el.attributes.get("required").map(String::as_str), Some("true"));
        assert!(!el.attributes.contains_key("disabled"));
        assert!(!el.attributes.contains_key("title"));
    }

    #[test]
    fn test_attrs_object_style_and_class() {
        let mut el = Descriptor::new("div");
        attrs(
            &mut el,
            map(json!({ "style": { "color": "red" }, "class": { "active": true, "hidden": false } })),
        );
        assert_eq!(el.style, Some(Value::from(json!({ "color": "red" }))));
        assert_eq!(el.attributes.get("class").map(String::as_str), Some("active"));
        assert!(!el.attributes.contains_key("style"));
    }

    #[test]
    fn test_attrs_string_style_is_an_attribute() {
        let mut el = Descriptor::new("div");
        attrs(&mut el, map(json!({ "style": "color: red" })));
        assert_eq!(el.style, None);
        assert_eq!(el.attributes.get("style").map(String::as_str), Some("color: red"));
    }

    #[test]
    fn test_attrs_empty_class_dropped() {
        let mut el = Descriptor::new("div");
        attrs(&mut el, map(json!({ "class": { "off": false } })));
        assert!(el.attributes.is_empty());
    }

    #[test]
    fn test_attrs_hook_installed_as_property() {
        let mut el = Descriptor::new("div");
        let hook: HookRef = Rc::new(PropertyHook::new("x".into()));
        let mut values = Map::new();
        values.insert("data".to_string(), Value::Hook(hook.clone()));
        attrs(&mut el, values);

        assert!(el.attributes.is_empty());
        assert!(Rc::ptr_eq(el.hook("data").unwrap(), &hook));
    }

    #[test]
    fn test_props_class_merges_attribute_class() {
        let mut el = Descriptor::new("div");
        attrs(&mut el, map(json!({ "class": "base" })));
        props(&mut el, map(json!({ "class": { "active": true } })));

        assert_eq!(el.class_name.as_deref(), Some("base active"));
        assert!(!el.attributes.contains_key("class"));

        props(&mut el, map(json!({ "class": "extra" })));
        assert_eq!(el.class_name.as_deref(), Some("extra base active"));
    }

    #[test]
    fn test_props_empty_class_keeps_attribute() {
        let mut el = Descriptor::new("div");
        attrs(&mut el, map(json!({ "class": "base" })));
        props(&mut el, map(json!({ "class": { "active": false } })));
        assert_eq!(el.attributes.get("class").map(String::as_str), Some("base"));
        assert_eq!(el.class_name, None);
    }

    #[test]
    fn test_props_wrap_values_in_property_hooks() {
        let mut el = Descriptor::new("input");
        props(&mut el, map(json!({ "value": "abc", "style": { "width": 3 } })));

        let hook = el.hook("value").unwrap();
        let property = hook.as_any().downcast_ref::<PropertyHook>().unwrap();
        assert_eq!(property.value(), &Value::from("abc"));
        assert_eq!(el.style, Some(Value::from(json!({ "width": 3 }))));
    }

    #[test]
    fn test_events_replace_slot() {
        let mut el = Descriptor::new("button");
        let listener: Listener = Rc::new(|_: &crate::dom::Event| {});
        events(&mut el, None, vec![("click".to_string(), listener.clone())]);
        events(&mut el, None, vec![("input".to_string(), listener)]);

        let hook = el.hook(EVENTS_KEY).unwrap();
        let events = hook.as_any().downcast_ref::<EventHook>().unwrap().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "input");
    }

    #[test]
    fn test_hooks_and_handles() {
        let mut el = Descriptor::new("canvas");
        hooks(
            &mut el,
            vec![
                ("size".to_string(), HookInput::Subscribe(subscriber(|_, _, _| Ok(None)))),
                ("width".to_string(), HookInput::Value(10i64.into())),
            ],
        );
        handles(&mut el, HandleTarget::default(), vec!["canvas".to_string()]);

        assert_eq!(el.hook("size").map(|h| h.kind()), Some("Function"));
        assert!(matches!(el.properties.get("width"), Some(Property::Value(Value::Number(n))) if *n == 10.0));
        assert_eq!(el.hook(HANDLE_KEY).map(|h| h.kind()), Some("Handle"));
    }
}
