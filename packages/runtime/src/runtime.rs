use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::backend::Backend;
use crate::descriptor::ElementDescriptor;
use crate::dispatch::{self, HookInput};
use crate::dom::{Listener, Owner};
use crate::hooks::HandleTarget;
use crate::value::{Map, Value};
use crate::vdom::VirtualDom;
use crate::widget::{HtmlWidget, RawValue};

/// What a registered mixin receives.
pub struct MixinCall<N> {
    pub attributes: Map,
    pub arguments: Vec<Value>,
    /// Nodes produced by the block nested under the mixin call.
    pub block: Vec<N>,
}

pub type Mixin<B> = Rc<dyn Fn(&Runtime<B>, MixinCall<<B as Backend>::Node>) -> Vec<<B as Backend>::Node>>;

/// Root of one template invocation, returned by [`Runtime::init`].
pub struct Accumulator<N> {
    root: ElementDescriptor<N>,
    owner: Option<Owner>,
    supplied: bool,
}

impl<N> Accumulator<N> {
    /// The `this` the template was invoked with.
    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }
}

impl<N> Deref for Accumulator<N> {
    type Target = ElementDescriptor<N>;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}

impl<N> DerefMut for Accumulator<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.root
    }
}

/// The entry points a compiled template calls, over a pluggable backend.
pub struct Runtime<B: Backend> {
    backend: B,
    mixins: HashMap<String, Mixin<B>>,
}

impl Runtime<VirtualDom> {
    pub fn virtual_dom() -> Self {
        Self::new(VirtualDom)
    }
}

impl<B: Backend> Runtime<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            mixins: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn register_mixin<F>(&mut self, name: &str, mixin: F)
    where
        F: Fn(&Runtime<B>, MixinCall<B::Node>) -> Vec<B::Node> + 'static,
    {
        self.mixins.insert(name.to_string(), Rc::new(mixin));
    }

    pub fn init(&self, this: Option<Owner>, initial: Option<ElementDescriptor<B::Node>>) -> Accumulator<B::Node> {
        Accumulator {
            supplied: initial.is_some(),
            root: initial.unwrap_or_else(|| ElementDescriptor::new("")),
            owner: this,
        }
    }

    /// Finish an invocation. A supplied root element is returned as an
    /// element; otherwise a single child stands alone and anything else is
    /// wrapped in a fragment.
    pub fn end(&self, mut accumulator: Accumulator<B::Node>) -> B::Node {
        if accumulator.supplied {
            return self.backend.element(accumulator.root);
        }

        match accumulator.root.children.len() {
            1 => match accumulator.root.children.pop() {
                Some(only) => only,
                None => self.backend.fragment(Vec::new()),
            },
            _ => self.backend.fragment(accumulator.root.children),
        }
    }

    pub fn create(&self, tag_name: &str) -> ElementDescriptor<B::Node> {
        ElementDescriptor::new(tag_name)
    }

    pub fn child(&self, context: &mut ElementDescriptor<B::Node>, node: B::Node) {
        context.children.push(node);
    }

    pub fn element(&self, descriptor: ElementDescriptor<B::Node>) -> B::Node {
        self.backend.element(descriptor)
    }

    pub fn attrs(&self, context: &mut ElementDescriptor<B::Node>, values: Map) {
        dispatch::attrs(context, values);
    }

    pub fn props(&self, context: &mut ElementDescriptor<B::Node>, values: Map) {
        dispatch::props(context, values);
    }

    pub fn events(&self, context: &mut ElementDescriptor<B::Node>, this: Option<Owner>, pairs: Vec<(String, Listener)>) {
        dispatch::events(context, this, pairs);
    }

    pub fn hooks(&self, context: &mut ElementDescriptor<B::Node>, entries: Vec<(String, HookInput)>) {
        dispatch::hooks(context, entries);
    }

    pub fn handles(&self, context: &mut ElementDescriptor<B::Node>, target: HandleTarget, names: Vec<String>) {
        dispatch::handles(context, target, names);
    }

    /// Lists pass their index as the key, maps their entry name. Anything
    /// else has nothing to iterate.
    pub fn each<E, F>(&self, collection: &Value, mut callback: F) -> Result<(), E>
    where
        F: FnMut(Value, Value) -> Result<(), E>,
    {
        match collection {
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    callback(item.clone(), Value::from(index))?;
                }
            }
            Value::Map(entries) => {
                for (key, value) in entries {
                    callback(value.clone(), Value::from(key.as_str()))?;
                }
            }
            other => trace!(kind = other.type_name(), "each over non-collection"),
        }
        Ok(())
    }

    pub fn text(&self, value: &Value, raw: bool) -> B::Node {
        if let Value::Node(node) = value {
            if let Some(node) = node.downcast_ref::<B::Node>() {
                return node.clone();
            }
            debug!("node value from another backend, rendering as text");
        }

        if raw && value.is_truthy() {
            return self.backend.widget(HtmlWidget::new(RawValue::from(value)));
        }

        match value {
            Value::Null => self.backend.text(String::new()),
            other => self.backend.text(other.to_text()),
        }
    }

    pub fn mixin(
        &self,
        context: &mut ElementDescriptor<B::Node>,
        mut target: ElementDescriptor<B::Node>,
        attributes: Map,
        arguments: Vec<Value>,
    ) {
        let name = target.tag_name.clone();

        match self.mixins.get(&name) {
            Some(mixin) => {
                let call = MixinCall {
                    attributes,
                    arguments,
                    block: std::mem::take(&mut target.children),
                };
                context.children.extend(mixin(self, call));
            }
            None => {
                debug!(mixin = %name, "no mixin registered, rendering as element");
                dispatch::attrs(&mut target, attributes);
                context.children.push(self.backend.element(target));
            }
        }
    }
}
