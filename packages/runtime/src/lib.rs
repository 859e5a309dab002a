mod backend;
mod descriptor;
pub mod dispatch;
pub mod dom;
mod error;
pub mod hooks;
mod runtime;
mod value;
mod vdom;
mod widget;

pub use backend::Backend;
pub use descriptor::{ElementDescriptor, Property};
pub use dispatch::HookInput;
pub use dom::{Document, Event, Listener, Owner};
pub use error::{DomError, HookError};
pub use hooks::{Hook, HookRef};
pub use runtime::{Accumulator, Mixin, MixinCall, Runtime};
pub use value::{Function, Map, Value};
pub use vdom::{VNode, VirtualDom};
pub use widget::{HtmlWidget, RawValue};

#[cfg(test)]
mod tests;
