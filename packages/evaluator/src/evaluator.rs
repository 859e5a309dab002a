//! Direct execution of a template tree.
//!
//! The evaluator walks the same node kinds as the code generator and makes
//! the same runtime calls, in the same order, that the generated function
//! would make. Attribute values, tests and loop sources are expressions in
//! the small language of [`crate::expression`].

use facade_ast::{
    classify, text_literal, unflatten, Attribute, AttributeBlock, AttributeKind, KeyTree, Node, NodeKind,
};
use std::rc::Rc;

use facade_runtime::{
    dom, Backend, Document, ElementDescriptor, Event, Listener, Map, Owner, Runtime, Value, VirtualDom,
};
use tracing::{debug, error, instrument};

use crate::error::{EvalError, EvalResult};
use crate::expression::{parse_arguments, parse_expression, parse_statements};
use crate::interpreter::{evaluate, execute};
use crate::scope::Scope;

pub struct Evaluator<'rt, B: Backend> {
    runtime: &'rt Runtime<B>,
    owner: Option<Owner>,
}

impl<'rt, B: Backend> Evaluator<'rt, B> {
    pub fn new(runtime: &'rt Runtime<B>) -> Self {
        Self { runtime, owner: None }
    }

    /// The `this` passed to `init` and to every event hook.
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    #[instrument(skip_all)]
    pub fn render(&self, template: &Node, globals: Map) -> EvalResult<B::Node> {
        let mut scope = Scope::new(globals);
        let mut result = self.runtime.init(self.owner.clone(), None);
        self.visit(template, &mut result, &mut scope)?;
        debug!(children = result.children.len(), "rendered template");
        Ok(self.runtime.end(result))
    }

    fn visit(&self, node: &Node, context: &mut ElementDescriptor<B::Node>, scope: &mut Scope) -> EvalResult<()> {
        let rt = self.runtime;

        match &node.kind {
            NodeKind::Block { nodes } => nodes
                .iter()
                .try_for_each(|child| self.visit(child, context, scope)),

            NodeKind::Tag {
                name,
                attrs,
                attribute_blocks,
                block,
            } => {
                let mut element = rt.create(name);
                self.apply_attributes(attrs, attribute_blocks, &mut element, scope)?;
                if let Some(block) = block {
                    self.visit(block, &mut element, scope)?;
                }
                rt.child(context, rt.element(element));
                Ok(())
            }

            NodeKind::Text { val } => {
                let value = self.eval(&text_literal(val), scope)?;
                rt.child(context, rt.text(&value, false));
                Ok(())
            }

            NodeKind::Code {
                val,
                buffer,
                must_escape,
            } => {
                if *buffer {
                    let value = self.eval(val, scope)?;
                    rt.child(context, rt.text(&value, !*must_escape));
                } else {
                    for statement in parse_statements(val)? {
                        execute(&statement, scope)?;
                    }
                }
                Ok(())
            }

            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, scope)?.is_truthy() {
                    scope.scoped(|scope| self.visit(consequent, context, scope))
                } else if let Some(alternate) = alternate {
                    scope.scoped(|scope| self.visit(alternate, context, scope))
                } else {
                    Ok(())
                }
            }

            NodeKind::Each { obj, val, key, block } => {
                let collection = self.eval(obj, scope)?;
                rt.each(&collection, |value, index| {
                    scope.scoped(|scope| {
                        scope.declare(val, value);
                        if let Some(key) = key {
                            scope.declare(key, index);
                        }
                        self.visit(block, context, scope)
                    })
                })
            }

            NodeKind::Mixin {
                name,
                args,
                attrs,
                attribute_blocks,
                block,
                ..
            } => {
                let mut target = rt.create(name);

                let mut attributes = Map::new();
                for attr in attrs {
                    attributes.insert(attr.name.clone(), self.eval(&attr.val, scope)?);
                }
                self.assign_blocks(&mut attributes, attribute_blocks, scope)?;

                let arguments = match args {
                    Some(args) => parse_arguments(args)?
                        .iter()
                        .map(|argument| evaluate(argument, scope))
                        .collect::<EvalResult<Vec<_>>>()?,
                    None => Vec::new(),
                };

                if let Some(block) = block {
                    self.visit(block, &mut target, scope)?;
                }
                rt.mixin(context, target, attributes, arguments);
                Ok(())
            }

            NodeKind::Comment { .. } | NodeKind::BlockComment { .. } => Ok(()),

            unsupported => Err(EvalError::UnsupportedNode {
                kind: unsupported.type_name(),
                line: node.line,
            }),
        }
    }

    /// Same split as the generated `attrs` / `props` / `events` calls.
    fn apply_attributes(
        &self,
        attrs: &[Attribute],
        blocks: &[AttributeBlock],
        element: &mut ElementDescriptor<B::Node>,
        scope: &Scope,
    ) -> EvalResult<()> {
        let mut plain: Vec<(String, Vec<Value>)> = Vec::new();
        let mut properties = Vec::new();
        let mut events: Vec<(String, Listener)> = Vec::new();

        for attr in attrs {
            match classify(&attr.name) {
                AttributeKind::Event(name) => events.push((name.to_string(), listener(name, &attr.val, scope)?)),
                AttributeKind::Property(name) => properties.push((name.to_string(), self.eval(&attr.val, scope)?)),
                AttributeKind::Attribute(name) => {
                    let value = self.eval(&attr.val, scope)?;
                    match plain.iter_mut().find(|(existing, _)| existing.as_str() == name) {
                        Some((_, values)) => values.push(value),
                        None => plain.push((name.to_string(), vec![value])),
                    }
                }
            }
        }

        if !plain.is_empty() || !blocks.is_empty() {
            let mut map: Map = plain
                .into_iter()
                .map(|(name, mut values)| {
                    let value = if values.len() == 1 {
                        values.remove(0)
                    } else {
                        Value::List(values)
                    };
                    (name, value)
                })
                .collect();
            self.assign_blocks(&mut map, blocks, scope)?;
            self.runtime.attrs(element, map);
        }

        if !properties.is_empty() {
            self.runtime.props(element, tree_to_map(unflatten(properties)));
        }

        if !events.is_empty() {
            self.runtime.events(element, self.owner.clone(), events);
        }

        Ok(())
    }

    /// `Object.assign` of every `&attributes(...)` block onto `target`.
    fn assign_blocks(&self, target: &mut Map, blocks: &[AttributeBlock], scope: &Scope) -> EvalResult<()> {
        for block in blocks {
            match self.eval(block.expression(), scope)? {
                Value::Map(entries) => target.extend(entries),
                Value::Null => {}
                other => {
                    return Err(EvalError::type_error(format!(
                        "attribute block must be an object, got {}",
                        other.type_name()
                    )))
                }
            }
        }
        Ok(())
    }

    fn eval(&self, source: &str, scope: &Scope) -> EvalResult<Value> {
        evaluate(&parse_expression(source)?, scope)
    }
}

impl<'rt> Evaluator<'rt, VirtualDom> {
    /// Render and mount in one go, running every hook.
    pub fn render_live(&self, template: &Node, globals: Map, document: &Document) -> EvalResult<Vec<dom::Node>> {
        let tree = self.render(template, globals)?;
        Ok(tree.mount(document)?)
    }
}

/// Listener that evaluates `source` each time the event fires, against the
/// scope as it was at render time plus `e` (and `this` when the owner is a
/// [`Value`]). The expression is parsed up front so syntax errors surface
/// from `render`.
fn listener(event: &str, source: &str, scope: &Scope) -> EvalResult<Listener> {
    let expression = parse_expression(source)?;
    let snapshot = scope.clone();
    let event = event.to_string();

    Ok(Rc::new(move |fired: &Event| {
        let mut e = Map::new();
        e.insert("type".to_string(), Value::from(fired.kind.as_str()));
        e.insert("target".to_string(), Value::node(fired.target.clone()));

        let mut scope = snapshot.clone();
        scope.push();
        if let Some(this) = fired.this.as_ref().and_then(|this| this.downcast_ref::<Value>()) {
            scope.declare("this", this.clone());
        }
        scope.declare("e", Value::Map(e));

        if let Err(err) = evaluate(&expression, &scope) {
            error!(event = %event, error = %err, "event handler failed");
        }
    }))
}

fn tree_to_map(entries: Vec<(String, KeyTree<Value>)>) -> Map {
    entries
        .into_iter()
        .map(|(key, tree)| {
            let value = match tree {
                KeyTree::Leaf(value) => value,
                KeyTree::Branch(children) => Value::Map(tree_to_map(children)),
            };
            (key, value)
        })
        .collect()
}
