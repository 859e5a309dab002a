use facade_ast::{classify, unflatten, Attribute, AttributeBlock, AttributeKind};

use crate::context::CompilerContext;
use crate::object::{assign, quote, render_tree, MultiValueObject};

/// Emit the `attrs` / `props` / `events` calls for one element.
pub(crate) fn compile_attributes(
    attrs: &[Attribute],
    blocks: &[AttributeBlock],
    element: &str,
    ctx: &mut CompilerContext,
) {
    let mut events = Vec::new();
    let mut attributes = MultiValueObject::default();
    let mut properties = Vec::new();

    for attr in attrs {
        match classify(&attr.name) {
            AttributeKind::Event(name) => {
                events.push(format!("[{}, e => {}]", quote(name), attr.val));
            }
            AttributeKind::Property(name) => {
                properties.push((name.to_string(), attr.val.clone()));
            }
            AttributeKind::Attribute(name) => attributes.push(name, &attr.val),
        }
    }

    let spreads: Vec<&str> = blocks.iter().map(AttributeBlock::expression).collect();

    if !attributes.is_empty() {
        let object = attributes.render();
        if spreads.is_empty() {
            ctx.add_line(&format!("$$.attrs({}, {})", element, object));
        } else {
            ctx.add_line(&format!("$$.attrs({}, {})", element, assign(&object, &spreads)));
        }
    } else if !spreads.is_empty() {
        ctx.add_line(&format!("$$.attrs({}, {})", element, assign("{}", &spreads)));
    }

    if !properties.is_empty() {
        let properties = render_tree(&unflatten(properties));
        ctx.add_line(&format!("$$.props({}, {})", element, properties));
    }

    if !events.is_empty() {
        ctx.add_line(&format!("$$.events({}, this, [{}])", element, events.join(", ")));
    }
}
