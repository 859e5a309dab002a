use std::fmt;

use crate::descriptor::ElementDescriptor;
use crate::widget::HtmlWidget;

/// Turns finished descriptors into the node type a runtime produces.
pub trait Backend {
    type Node: Clone + fmt::Debug + 'static;

    fn element(&self, descriptor: ElementDescriptor<Self::Node>) -> Self::Node;

    fn text(&self, text: String) -> Self::Node;

    fn widget(&self, widget: HtmlWidget) -> Self::Node;

    fn fragment(&self, children: Vec<Self::Node>) -> Self::Node;
}
