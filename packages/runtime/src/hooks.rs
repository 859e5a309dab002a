use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Listener, Node, Owner};
use crate::error::HookError;
use crate::value::Value;

pub type HookRef = Rc<dyn Hook>;

/// Something that attaches itself to a live node when its element is
/// rendered, and detaches when the element goes away.
///
/// `previous` is the hook that occupied the same property slot on the prior
/// render, if any.
pub trait Hook: Any {
    fn hook(&self, node: &Node, property: &str, previous: Option<&HookRef>) -> Result<(), HookError>;

    fn unhook(&self, _node: &Node) -> Result<(), HookError> {
        Ok(())
    }

    fn kind(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hook", self.kind())
    }
}

fn previous_as<'a, T: 'static>(previous: Option<&'a HookRef>) -> Option<&'a T> {
    previous.and_then(|hook| hook.as_any().downcast_ref::<T>())
}

/// Listener registrations for one element.
pub struct EventHook {
    events: Vec<(String, Listener)>,
    owner: Option<Owner>,
}

impl EventHook {
    pub fn new(events: Vec<(String, Listener)>) -> Self {
        Self {
            events,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: Option<Owner>) -> Self {
        self.owner = owner;
        self
    }

    pub fn events(&self) -> &[(String, Listener)] {
        &self.events
    }
}

impl Hook for EventHook {
    fn hook(&self, node: &Node, _property: &str, previous: Option<&HookRef>) -> Result<(), HookError> {
        if let Some(previous) = previous_as::<EventHook>(previous) {
            for (event, listener) in &previous.events {
                node.remove_event_listener(event, listener);
            }
        }

        for (event, listener) in &self.events {
            node.add_event_listener(event, listener, self.owner.clone());
        }
        Ok(())
    }

    fn unhook(&self, node: &Node) -> Result<(), HookError> {
        for (event, listener) in &self.events {
            node.remove_event_listener(event, listener);
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "Event"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub type Unsubscribe = Box<dyn FnOnce()>;
pub type Subscriber =
    Rc<dyn Fn(&Node, &str, Option<&HookRef>) -> Result<Option<Unsubscribe>, HookError>>;

pub fn subscriber<F>(subscribe: F) -> Subscriber
where
    F: Fn(&Node, &str, Option<&HookRef>) -> Result<Option<Unsubscribe>, HookError> + 'static,
{
    Rc::new(subscribe)
}

/// Wraps a user subscription. Whatever the subscriber returns is called
/// once on unhook.
pub struct FunctionHook {
    subscriber: Option<Subscriber>,
    unsubscribe: RefCell<Option<Unsubscribe>>,
}

impl FunctionHook {
    pub fn new(subscriber: Option<Subscriber>) -> Self {
        Self {
            subscriber,
            unsubscribe: RefCell::new(None),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.unsubscribe.borrow().is_some()
    }
}

impl Hook for FunctionHook {
    fn hook(&self, node: &Node, property: &str, previous: Option<&HookRef>) -> Result<(), HookError> {
        if let Some(subscriber) = &self.subscriber {
            let unsubscribe = subscriber(node, property, previous)?;
            *self.unsubscribe.borrow_mut() = unsubscribe;
        }
        Ok(())
    }

    fn unhook(&self, _node: &Node) -> Result<(), HookError> {
        let unsubscribe = self.unsubscribe.borrow_mut().take();
        if let Some(unsubscribe) = unsubscribe {
            unsubscribe();
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "Function"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Writes a value onto a node property, skipping writes that would not
/// change anything.
pub struct PropertyHook {
    value: Value,
}

impl PropertyHook {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Hook for PropertyHook {
    fn hook(&self, node: &Node, property: &str, previous: Option<&HookRef>) -> Result<(), HookError> {
        let first = previous_as::<PropertyHook>(previous).is_none();
        if first || node.property(property).as_ref() != Some(&self.value) {
            node.set_property(property, self.value.clone());
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "Property"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub type HandleTarget = Rc<RefCell<BTreeMap<String, Option<Node>>>>;

/// Publishes the live node under one or more names on a shared target.
pub struct HandleHook {
    target: HandleTarget,
    names: Vec<String>,
}

impl HandleHook {
    pub fn new(target: HandleTarget, names: Vec<String>) -> Self {
        Self { target, names }
    }
}

impl Hook for HandleHook {
    fn hook(&self, node: &Node, _property: &str, _previous: Option<&HookRef>) -> Result<(), HookError> {
        let mut target = self.target.borrow_mut();
        for name in &self.names {
            target.insert(name.clone(), Some(node.clone()));
        }
        Ok(())
    }

    fn unhook(&self, _node: &Node) -> Result<(), HookError> {
        let mut target = self.target.borrow_mut();
        for name in &self.names {
            target.insert(name.clone(), None);
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "Handle"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
