//! A small live node tree. Hooks and widgets operate on it the way they
//! would on a browser document: attributes, expando properties, listeners.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_fragment, QualName};
use markup5ever_rcdom::{Handle, NodeData as MarkupData, RcDom};
use tracing::debug;

use crate::error::DomError;
use crate::value::Value;

pub type Listener = Rc<dyn Fn(&Event)>;

/// The `this` a compiled template was invoked with.
pub type Owner = Rc<dyn Any>;

pub struct Event {
    pub kind: String,
    pub target: Node,
    pub this: Option<Owner>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Element(String),
    Text(String),
    Comment(String),
}

impl NodeType {
    fn label(&self) -> &'static str {
        match self {
            NodeType::Element(_) => "element",
            NodeType::Text(_) => "text",
            NodeType::Comment(_) => "comment",
        }
    }
}

struct Registration {
    event: String,
    listener: Listener,
    owner: Option<Owner>,
}

struct NodeData {
    node_type: NodeType,
    parent: Weak<RefCell<NodeData>>,
    children: Vec<Node>,
    attributes: BTreeMap<String, String>,
    properties: BTreeMap<String, Value>,
    listeners: Vec<Registration>,
    property_writes: usize,
}

#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    fn new(node_type: NodeType) -> Self {
        Node(Rc::new(RefCell::new(NodeData {
            node_type,
            parent: Weak::new(),
            children: Vec::new(),
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            listeners: Vec::new(),
            property_writes: 0,
        })))
    }

    pub fn element(tag_name: &str) -> Self {
        Self::new(NodeType::Element(tag_name.to_string()))
    }

    pub fn text(text: &str) -> Self {
        Self::new(NodeType::Text(text.to_string()))
    }

    pub fn comment(text: &str) -> Self {
        Self::new(NodeType::Comment(text.to_string()))
    }

    pub fn node_type(&self) -> NodeType {
        self.0.borrow().node_type.clone()
    }

    pub fn tag_name(&self) -> Option<String> {
        match &self.0.borrow().node_type {
            NodeType::Element(tag) => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    /// Append `child`, moving it out of any parent it already has.
    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        {
            let data = self.0.borrow();
            if !matches!(data.node_type, NodeType::Element(_)) {
                return Err(DomError::NotAContainer(data.node_type.label()));
            }
        }
        child.remove();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
        Ok(())
    }

    /// Detach from the parent. A detached node is left as is.
    pub fn remove(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent
            .0
            .borrow_mut()
            .children
            .retain(|sibling| !sibling.ptr_eq(self));
        self.0.borrow_mut().parent = Weak::new();
    }

    /// Put `nodes` where this node is, then detach it.
    pub fn replace_with(&self, nodes: &[Node]) -> Result<(), DomError> {
        let parent = self.parent().ok_or(DomError::Detached)?;

        for node in nodes {
            node.remove();
        }

        let mut data = parent.0.borrow_mut();
        let index = data
            .children
            .iter()
            .position(|sibling| sibling.ptr_eq(self))
            .ok_or(DomError::Detached)?;

        data.children.splice(index..=index, nodes.iter().cloned());
        for node in nodes {
            node.0.borrow_mut().parent = Rc::downgrade(&parent.0);
        }
        drop(data);

        self.0.borrow_mut().parent = Weak::new();
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.borrow().attributes.get(name).cloned()
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.0.borrow().attributes.clone()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.0
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.0.borrow().properties.get(name).cloned()
    }

    pub fn set_property(&self, name: &str, value: Value) {
        let mut data = self.0.borrow_mut();
        data.property_writes += 1;
        data.properties.insert(name.to_string(), value);
    }

    pub fn remove_property(&self, name: &str) -> Option<Value> {
        self.0.borrow_mut().properties.remove(name)
    }

    /// Number of `set_property` calls made on this node.
    pub fn property_writes(&self) -> usize {
        self.0.borrow().property_writes
    }

    pub fn add_event_listener(&self, event: &str, listener: &Listener, owner: Option<Owner>) {
        self.0.borrow_mut().listeners.push(Registration {
            event: event.to_string(),
            listener: listener.clone(),
            owner,
        });
    }

    /// Remove the first registration of exactly this listener for `event`.
    pub fn remove_event_listener(&self, event: &str, listener: &Listener) -> bool {
        let mut data = self.0.borrow_mut();
        let found = data
            .listeners
            .iter()
            .position(|r| r.event == event && Rc::ptr_eq(&r.listener, listener));

        match found {
            Some(index) => {
                data.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.0.borrow().listeners.len()
    }

    /// Invoke every listener registered for `event`, in registration order.
    /// Returns how many ran.
    pub fn dispatch_event(&self, event: &str) -> usize {
        let matching: Vec<(Listener, Option<Owner>)> = self
            .0
            .borrow()
            .listeners
            .iter()
            .filter(|r| r.event == event)
            .map(|r| (r.listener.clone(), r.owner.clone()))
            .collect();

        for (listener, owner) in &matching {
            listener(&Event {
                kind: event.to_string(),
                target: self.clone(),
                this: owner.clone(),
            });
        }

        matching.len()
    }

    pub fn text_content(&self) -> String {
        let data = self.0.borrow();
        match &data.node_type {
            NodeType::Text(text) => text.clone(),
            NodeType::Comment(_) => String::new(),
            NodeType::Element(_) => data.children.iter().map(Node::text_content).collect(),
        }
    }

    pub fn outer_html(&self) -> String {
        let data = self.0.borrow();
        match &data.node_type {
            NodeType::Text(text) => text.clone(),
            NodeType::Comment(text) => format!("<!--{}-->", text),
            NodeType::Element(tag) => {
                let attributes: String = data
                    .attributes
                    .iter()
                    .map(|(name, value)| format!(" {}=\"{}\"", name, value))
                    .collect();
                let children: String = data.children.iter().map(Node::outer_html).collect();
                format!("<{tag}{attributes}>{children}</{tag}>")
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Node")
            .field("type", &data.node_type)
            .field("children", &data.children.len())
            .finish()
    }
}

/// Factory for live nodes parsed from markup.
#[derive(Debug, Clone, Default)]
pub struct Document;

impl Document {
    /// Parse `markup` as the contents of a `<template>` element and return the
    /// top-level nodes, detached.
    pub fn parse_fragment(&self, markup: &str) -> Vec<Node> {
        let context = QualName::new(None, ns!(html), local_name!("template"));
        let dom = parse_fragment(RcDom::default(), Default::default(), context, Vec::new())
            .one(markup);

        let document = dom.document.children.borrow();
        let nodes = document
            .iter()
            .flat_map(|root| {
                root.children
                    .borrow()
                    .iter()
                    .filter_map(convert)
                    .collect::<Vec<_>>()
            })
            .collect();
        nodes
    }
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        MarkupData::Text { contents } => Some(Node::text(&contents.borrow())),
        MarkupData::Comment { contents } => Some(Node::comment(contents)),
        MarkupData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let element = Node::element(&name.local);
            for attr in attrs.borrow().iter() {
                element.set_attribute(&attr.name.local, &attr.value);
            }

            let contents = template_contents.borrow();
            let children = match contents.as_ref() {
                Some(fragment) => fragment.children.borrow().clone(),
                None => handle.children.borrow().clone(),
            };
            for child in children.iter().filter_map(convert) {
                if let Err(err) = element.append_child(&child) {
                    debug!(error = %err, tag = %name.local, "dropped parsed child");
                }
            }
            Some(element)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_append_and_remove() {
        let parent = Node::element("ul");
        let child = Node::element("li");
        parent.append_child(&child).unwrap();
        assert!(child.parent().unwrap().ptr_eq(&parent));

        child.remove();
        assert!(child.parent().is_none());
        assert!(parent.children().is_empty());

        // Removing twice is a no-op.
        child.remove();
    }

    #[test]
    fn test_text_nodes_have_no_children() {
        let text = Node::text("x");
        assert_eq!(
            text.append_child(&Node::text("y")),
            Err(DomError::NotAContainer("text"))
        );
    }

    #[test]
    fn test_replace_with_keeps_position() {
        let parent = Node::element("div");
        let a = Node::text("a");
        let b = Node::text("b");
        let c = Node::text("c");
        for node in [&a, &b, &c] {
            parent.append_child(node).unwrap();
        }

        b.replace_with(&[Node::text("x"), Node::text("y")]).unwrap();
        assert_eq!(parent.text_content(), "axyc");
        assert!(b.parent().is_none());
    }

    #[test]
    fn test_replace_detached_fails() {
        let node = Node::text("a");
        assert_eq!(node.replace_with(&[]), Err(DomError::Detached));
    }

    #[test]
    fn test_listeners() {
        let node = Node::element("button");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let listener: Listener = Rc::new(move |event: &Event| {
            assert_eq!(event.kind, "click");
            counter.set(counter.get() + 1);
        });

        node.add_event_listener("click", &listener, None);
        assert_eq!(node.dispatch_event("click"), 1);
        assert_eq!(node.dispatch_event("input"), 0);
        assert_eq!(hits.get(), 1);

        assert!(node.remove_event_listener("click", &listener));
        assert!(!node.remove_event_listener("click", &listener));
        assert_eq!(node.listener_count(), 0);
    }

    #[test]
    fn test_property_writes_counted() {
        let node = Node::element("input");
        node.set_property("value", "a".into());
        node.set_property("value", "b".into());
        assert_eq!(node.property("value"), Some(Value::from("b")));
        assert_eq!(node.property_writes(), 2);
    }

    #[test]
    fn test_parse_fragment() {
        let nodes = Document.parse_fragment("<b class=\"x\">bold</b> and <i>it</i>");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].tag_name().as_deref(), Some("b"));
        assert_eq!(nodes[0].attribute("class").as_deref(), Some("x"));
        assert_eq!(nodes[1].node_type(), NodeType::Text(" and ".to_string()));
        assert!(nodes.iter().all(|node| node.parent().is_none()));
    }

    #[test]
    fn test_parse_fragment_keeps_nested_children() {
        let nodes = Document.parse_fragment("<ul><li>a</li><li>b<em>!</em></li></ul>");
        assert_eq!(nodes.len(), 1);

        let items = nodes[0].children();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.parent().is_some()));
        assert_eq!(items[1].children().len(), 2);
        assert_eq!(nodes[0].outer_html(), "<ul><li>a</li><li>b<em>!</em></li></ul>");
    }

    #[test]
    fn test_parse_empty_fragment() {
        assert!(Document.parse_fragment("").is_empty());
    }

    #[test]
    fn test_outer_html() {
        let nodes = Document.parse_fragment("<p id=\"a\">x<!--c--></p>");
        assert_eq!(nodes[0].outer_html(), "<p id=\"a\">x<!--c--></p>");
    }
}
