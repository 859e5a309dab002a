use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::Backend;
use crate::descriptor::{ElementDescriptor, Property};
use crate::dom::{self, Document};
use crate::error::HookError;
use crate::widget::HtmlWidget;

/// Backend producing [`VNode`] trees.
#[derive(Debug, Clone, Default)]
pub struct VirtualDom;

#[derive(Debug, Clone)]
pub enum VNode {
    Element(ElementDescriptor<VNode>),
    Text(String),
    Widget(Rc<RefCell<HtmlWidget>>),
    Fragment(Vec<VNode>),
}

impl VNode {
    pub fn as_element(&self) -> Option<&ElementDescriptor<VNode>> {
        match self {
            VNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element(element) => &element.children,
            VNode::Fragment(children) => children,
            VNode::Text(_) | VNode::Widget(_) => &[],
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(|element| element.tag_name.as_str())
    }

    /// Concatenated text, widgets contributing their raw markup.
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text(text) => text.clone(),
            VNode::Widget(widget) => widget.borrow().value().markup.clone(),
            VNode::Element(_) | VNode::Fragment(_) => {
                self.children().iter().map(VNode::text_content).collect()
            }
        }
    }

    /// Create live nodes for this tree, running every hook against the node
    /// it belongs to. Fragments mount as their children.
    pub fn mount(&self, document: &Document) -> Result<Vec<dom::Node>, HookError> {
        match self {
            VNode::Text(text) => Ok(vec![dom::Node::text(text)]),
            VNode::Widget(widget) => widget.borrow_mut().init(document, None),
            VNode::Fragment(children) => {
                let mut nodes = Vec::new();
                for child in children {
                    nodes.extend(child.mount(document)?);
                }
                Ok(nodes)
            }
            VNode::Element(element) => {
                let node = dom::Node::element(&element.tag_name);

                for (name, value) in &element.attributes {
                    node.set_attribute(name, value);
                }
                if let Some(class_name) = &element.class_name {
                    node.set_attribute("class", class_name);
                }
                if let Some(style) = &element.style {
                    node.set_property("style", style.clone());
                }

                for (key, property) in &element.properties {
                    match property {
                        Property::Value(value) => node.set_property(key, value.clone()),
                        Property::Hook(hook) => hook.hook(&node, key, None)?,
                    }
                }

                for child in &element.children {
                    for live in child.mount(document)? {
                        node.append_child(&live)?;
                    }
                }

                Ok(vec![node])
            }
        }
    }
}

impl Backend for VirtualDom {
    type Node = VNode;

    fn element(&self, descriptor: ElementDescriptor<VNode>) -> VNode {
        VNode::Element(descriptor)
    }

    fn text(&self, text: String) -> VNode {
        VNode::Text(text)
    }

    fn widget(&self, widget: HtmlWidget) -> VNode {
        VNode::Widget(Rc::new(RefCell::new(widget)))
    }

    fn fragment(&self, children: Vec<VNode>) -> VNode {
        VNode::Fragment(children)
    }
}
