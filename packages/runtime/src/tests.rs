use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;

use crate::dom::NodeType;
use crate::hooks::{subscriber, HandleTarget, Unsubscribe};
use crate::*;

fn map(json: serde_json::Value) -> Map {
    match Value::from(json) {
        Value::Map(map) => map,
        other => panic!("expected an object, got {:?}", other),
    }
}

fn mount_one(node: &VNode) -> dom::Node {
    let mut nodes = node.mount(&Document).unwrap();
    assert_eq!(nodes.len(), 1);
    nodes.remove(0)
}

#[test]
fn test_single_root_is_returned_alone() {
    let rt = Runtime::virtual_dom();
    let mut result = rt.init(None, None);

    let mut div = rt.create("div");
    rt.attrs(&mut div, map(json!({ "id": "x" })));
    rt.child(&mut div, rt.text(&"Hello".into(), false));
    rt.child(&mut result, rt.element(div));

    let root = rt.end(result);
    assert_eq!(root.tag_name(), Some("div"));
    assert_eq!(root.text_content(), "Hello");

    let live = mount_one(&root);
    assert_eq!(live.outer_html(), "<div id=\"x\">Hello</div>");
}

#[test]
fn test_many_roots_become_a_fragment() {
    let rt = Runtime::virtual_dom();
    let mut result = rt.init(None, None);
    rt.child(&mut result, rt.element(rt.create("p")));
    rt.child(&mut result, rt.element(rt.create("p")));

    let root = rt.end(result);
    assert!(matches!(&root, VNode::Fragment(children) if children.len() == 2));
    assert_eq!(root.mount(&Document).unwrap().len(), 2);
}

#[test]
fn test_empty_template_is_an_empty_fragment() {
    let rt = Runtime::virtual_dom();
    let root = rt.end(rt.init(None, None));
    assert!(matches!(root, VNode::Fragment(children) if children.is_empty()));
}

#[test]
fn test_supplied_root_is_kept() {
    let rt = Runtime::virtual_dom();
    let mut result = rt.init(None, Some(rt.create("section")));
    rt.child(&mut result, rt.text(&1i64.into(), false));

    let root = rt.end(result);
    assert_eq!(root.tag_name(), Some("section"));
    assert_eq!(root.text_content(), "1");
}

#[test]
fn test_text_modes() {
    let rt = Runtime::virtual_dom();
    assert!(matches!(rt.text(&Value::Null, false), VNode::Text(text) if text.is_empty()));
    assert!(matches!(rt.text(&"<b>x</b>".into(), false), VNode::Text(text) if text == "<b>x</b>"));
    assert!(matches!(rt.text(&"<b>x</b>".into(), true), VNode::Widget(_)));
    assert!(matches!(rt.text(&"".into(), true), VNode::Text(_)));
}

#[test]
fn test_prebuilt_node_passes_through_text() {
    let rt = Runtime::virtual_dom();
    let mut badge = rt.create("span");
    rt.child(&mut badge, rt.text(&"new".into(), false));
    let badge = Value::node(rt.element(badge));

    for raw in [false, true] {
        let node = rt.text(&badge, raw);
        assert_eq!(node.tag_name(), Some("span"));
        assert_eq!(node.text_content(), "new");
    }

    let foreign = Value::node(42u8);
    assert!(matches!(rt.text(&foreign, false), VNode::Text(text) if text == "[object Object]"));
}

#[test]
fn test_raw_text_mounts_markup() {
    let rt = Runtime::virtual_dom();
    let mut p = rt.create("p");
    rt.child(&mut p, rt.text(&"<b>bold</b>".into(), true));

    let live = mount_one(&rt.element(p));
    assert_eq!(live.outer_html(), "<p><b>bold</b></p>");
}

#[test]
fn test_each_over_list_and_map() {
    let rt = Runtime::virtual_dom();
    let mut seen = Vec::new();

    rt.each::<(), _>(&Value::from(json!(["a", "b"])), |value, key| {
        seen.push(format!("{}={}", key, value));
        Ok(())
    })
    .unwrap();
    rt.each::<(), _>(&Value::from(json!({ "x": 1 })), |value, key| {
        seen.push(format!("{}={}", key, value));
        Ok(())
    })
    .unwrap();
    rt.each::<(), _>(&Value::Null, |_, _| panic!("nothing to iterate"))
        .unwrap();

    assert_eq!(seen, vec!["0=a", "1=b", "x=1"]);
}

#[test]
fn test_each_over_map_keeps_insertion_order() {
    let rt = Runtime::virtual_dom();
    let mut keys = Vec::new();

    rt.each::<(), _>(&Value::from(json!({ "zeta": 1, "alpha": 2 })), |_, key| {
        keys.push(key.to_text());
        Ok(())
    })
    .unwrap();

    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[test]
fn test_each_stops_on_error() {
    let rt = Runtime::virtual_dom();
    let mut calls = 0;
    let result = rt.each(&Value::from(json!([1, 2, 3])), |_, _| {
        calls += 1;
        if calls == 2 {
            Err("stop")
        } else {
            Ok(())
        }
    });
    assert_eq!(result, Err("stop"));
    assert_eq!(calls, 2);
}

#[test]
fn test_events_fire_with_owner() {
    let rt = Runtime::virtual_dom();
    let clicks = Rc::new(Cell::new(0));
    let this: Owner = Rc::new("widget-owner".to_string());
    let mut result = rt.init(Some(this), None);

    let counter = clicks.clone();
    let listener: Listener = Rc::new(move |event: &Event| {
        let owner = event.this.as_ref().and_then(|o| o.downcast_ref::<String>());
        assert_eq!(owner.map(String::as_str), Some("widget-owner"));
        counter.set(counter.get() + 1);
    });

    let mut button = rt.create("button");
    rt.events(&mut button, result.owner().cloned(), vec![("click".to_string(), listener)]);
    rt.child(&mut result, rt.element(button));

    let live = mount_one(&rt.end(result));
    live.dispatch_event("click");
    assert_eq!(clicks.get(), 1);
}

#[test]
fn test_props_and_class_on_mount() {
    let rt = Runtime::virtual_dom();
    let mut input = rt.create("input");
    rt.attrs(&mut input, map(json!({ "class": "field", "style": { "width": "3em" } })));
    rt.props(&mut input, map(json!({ "value": "abc", "class": ["wide"] })));

    let live = mount_one(&rt.element(input));
    assert_eq!(live.attribute("class").as_deref(), Some("field wide"));
    assert_eq!(live.property("value"), Some(Value::from("abc")));
    assert_eq!(live.property("style"), Some(Value::from(json!({ "width": "3em" }))));
}

#[test]
fn test_hooks_and_handles_on_mount() {
    let rt = Runtime::virtual_dom();
    let subscribed = Rc::new(Cell::new(false));
    let flag = subscribed.clone();
    let target = HandleTarget::default();

    let mut canvas = rt.create("canvas");
    rt.hooks(
        &mut canvas,
        vec![
            (
                "size".to_string(),
                HookInput::Subscribe(subscriber(move |_, _, _| {
                    flag.set(true);
                    Ok(None::<Unsubscribe>)
                })),
            ),
            ("width".to_string(), HookInput::Value(300i64.into())),
        ],
    );
    rt.handles(&mut canvas, target.clone(), vec!["surface".to_string()]);

    let live = mount_one(&rt.element(canvas));
    assert!(subscribed.get());
    assert_eq!(live.property("width"), Some(Value::from(300i64)));
    assert!(target.borrow()["surface"].as_ref().unwrap().ptr_eq(&live));
}

#[test]
fn test_registered_mixin_receives_call() {
    let mut rt = Runtime::virtual_dom();
    rt.register_mixin("card", |rt, call: MixinCall<VNode>| {
        let mut article = rt.create("article");
        let title = call.attributes.get("title").cloned().unwrap_or_default();
        rt.attrs(&mut article, map(json!({ "data-title": title.to_text() })));
        for arg in &call.arguments {
            rt.child(&mut article, rt.text(arg, false));
        }
        article.children.extend(call.block);
        vec![rt.element(article)]
    });

    let mut result = rt.init(None, None);
    let mut target = rt.create("card");
    rt.child(&mut target, rt.text(&"body".into(), false));
    rt.mixin(&mut result, target, map(json!({ "title": "T" })), vec!["arg".into()]);

    let root = rt.end(result);
    assert_eq!(root.tag_name(), Some("article"));
    assert_eq!(root.text_content(), "argbody");
    assert_eq!(
        root.as_element().unwrap().attributes.get("data-title").map(String::as_str),
        Some("T")
    );
}

#[test]
fn test_unregistered_mixin_renders_custom_element() {
    let rt = Runtime::virtual_dom();
    let mut result = rt.init(None, None);
    rt.mixin(&mut result, rt.create("user-badge"), map(json!({ "name": "ann" })), Vec::new());

    let live = mount_one(&rt.end(result));
    assert_eq!(live.node_type(), NodeType::Element("user-badge".to_string()));
    assert_eq!(live.attribute("name").as_deref(), Some("ann"));
}
