//! Template tree consumed by the facade compiler.
//!
//! The markup parser is an external tool; this crate only describes the
//! node vocabulary it produces and decodes its JSON output.

pub mod ast;
pub mod attribute;
pub mod error;

pub use ast::{text_literal, Attribute, AttributeBlock, Node, NodeKind};
pub use attribute::{classify, key_path, unflatten, AttributeKind, KeyTree};
pub use error::{AstError, AstResult};
