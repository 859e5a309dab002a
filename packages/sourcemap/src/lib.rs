//! Source map utilities for the facade compiler
//!
//! Mappings are collected as plain records while code is generated and
//! encoded into a version 3 source map on demand.

pub mod builder;
pub mod record;

pub use builder::SourceMapBuilder;
pub use record::{Mapping, Position, SourceMapError, SourceMapRecord};
