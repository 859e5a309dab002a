use std::fmt;
use std::rc::Rc;

use crate::dom::{Document, Node};
use crate::error::HookError;
use crate::hooks::HookRef;
use crate::value::Value;

/// Unescaped markup, optionally carrying a hook that is attached to every
/// node parsed from it.
#[derive(Clone)]
pub struct RawValue {
    pub markup: String,
    pub hook: Option<HookRef>,
}

impl RawValue {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: HookRef) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Identity for update purposes: same markup and the same hook instance.
    fn same_as(&self, other: &RawValue) -> bool {
        self.markup == other.markup
            && match (&self.hook, &other.hook) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl From<&Value> for RawValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Hook(hook) => RawValue::new("").with_hook(hook.clone()),
            other => RawValue::new(other.to_text()),
        }
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawValue")
            .field("markup", &self.markup)
            .field("hook", &self.hook)
            .finish()
    }
}

/// Renders [`RawValue`] markup as live nodes and keeps them in sync across
/// renders.
pub struct HtmlWidget {
    value: RawValue,
    nodes: Option<Vec<Node>>,
}

impl HtmlWidget {
    pub fn new(value: RawValue) -> Self {
        Self { value, nodes: None }
    }

    pub fn value(&self) -> &RawValue {
        &self.value
    }

    /// Nodes currently owned by this widget, `None` before `init` and after
    /// `destroy`.
    pub fn nodes(&self) -> Option<&[Node]> {
        self.nodes.as_deref()
    }

    /// Parse the markup, remember the resulting nodes, and attach the hook
    /// (if any) to each of them under the `innerHTML` property.
    pub fn init(&mut self, document: &Document, previous: Option<&HtmlWidget>) -> Result<Vec<Node>, HookError> {
        let nodes = document.parse_fragment(&self.value.markup);
        self.nodes = Some(nodes.clone());

        if let Some(hook) = &self.value.hook {
            let previous_hook = previous.and_then(|widget| widget.value.hook.as_ref());
            for node in &nodes {
                hook.hook(node, "innerHTML", previous_hook)?;
            }
        }

        Ok(nodes)
    }

    /// Returns the replacement nodes when something was re-rendered, or
    /// `None` when the previous result still stands.
    ///
    /// An unchanged value takes over the previous widget's nodes. A changed
    /// value parses fresh nodes, splices them in where the old ones were, and
    /// tears the old ones down.
    pub fn update(
        &mut self,
        document: &Document,
        previous: Option<&mut HtmlWidget>,
    ) -> Result<Option<Vec<Node>>, HookError> {
        let Some(previous) = previous else {
            return Ok(None);
        };

        if previous.value.same_as(&self.value) {
            self.nodes = previous.nodes.take();
            return Ok(None);
        }

        let fresh = self.init(document, Some(&*previous))?;

        let Some(old) = previous.nodes.take() else {
            return Ok(Some(fresh));
        };

        if let Some(anchor) = old.first() {
            if anchor.parent().is_some() {
                anchor.replace_with(&fresh)?;
            }
        }
        remove_nodes(old, previous.value.hook.as_ref())?;

        Ok(Some(fresh))
    }

    /// Unhook and detach every node. A second call does nothing.
    pub fn destroy(&mut self) -> Result<(), HookError> {
        match self.nodes.take() {
            Some(nodes) => remove_nodes(nodes, self.value.hook.as_ref()),
            None => Ok(()),
        }
    }
}

fn remove_nodes(nodes: Vec<Node>, hook: Option<&HookRef>) -> Result<(), HookError> {
    for node in nodes {
        if let Some(hook) = hook {
            hook.unhook(&node)?;
        }
        node.remove();
    }
    Ok(())
}

impl fmt::Debug for HtmlWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlWidget")
            .field("value", &self.value)
            .field("nodes", &self.nodes.as_ref().map(Vec::len))
            .finish()
    }
}
