use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AstError, AstResult};

/// A node of the template tree, as produced by the markup parser.
///
/// The parser emits objects tagged by a `type` field; the fields shared by
/// every kind (`line`) live here and the kind-specific ones in [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub line: u32,
    /// Generated variable the node's output is appended to. Written by the
    /// code generator while it walks the tree.
    #[serde(skip)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Block {
        #[serde(default)]
        nodes: Vec<Node>,
    },
    Tag {
        name: String,
        #[serde(default)]
        attrs: Vec<Attribute>,
        #[serde(default, rename = "attributeBlocks")]
        attribute_blocks: Vec<AttributeBlock>,
        #[serde(default)]
        block: Option<Box<Node>>,
    },
    Text {
        #[serde(default)]
        val: String,
    },
    Code {
        val: String,
        #[serde(default)]
        buffer: bool,
        #[serde(default = "default_escape", rename = "mustEscape")]
        must_escape: bool,
    },
    Conditional {
        test: String,
        consequent: Box<Node>,
        #[serde(default)]
        alternate: Option<Box<Node>>,
    },
    Each {
        obj: String,
        val: String,
        #[serde(default)]
        key: Option<String>,
        block: Box<Node>,
    },
    Mixin {
        name: String,
        #[serde(default)]
        args: Option<String>,
        #[serde(default)]
        attrs: Vec<Attribute>,
        #[serde(default, rename = "attributeBlocks")]
        attribute_blocks: Vec<AttributeBlock>,
        #[serde(default)]
        block: Option<Box<Node>>,
        #[serde(default)]
        call: bool,
    },
    Comment {
        #[serde(default)]
        val: String,
    },
    BlockComment {
        #[serde(default)]
        val: String,
    },

    // Kinds the parser knows about but templates compiled here cannot use.
    Doctype {},
    Case {},
    When {},
    While {},
    Filter {},
    Include {},
    RawInclude {},
    Extends {},
    NamedBlock {},
    MixinBlock {},
    YieldBlock {},
    InterpolatedTag {},
}

fn default_escape() -> bool {
    true
}

impl NodeKind {
    /// The parser's name for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Block { .. } => "Block",
            NodeKind::Tag { .. } => "Tag",
            NodeKind::Text { .. } => "Text",
            NodeKind::Code { .. } => "Code",
            NodeKind::Conditional { .. } => "Conditional",
            NodeKind::Each { .. } => "Each",
            NodeKind::Mixin { .. } => "Mixin",
            NodeKind::Comment { .. } => "Comment",
            NodeKind::BlockComment { .. } => "BlockComment",
            NodeKind::Doctype {} => "Doctype",
            NodeKind::Case {} => "Case",
            NodeKind::When {} => "When",
            NodeKind::While {} => "While",
            NodeKind::Filter {} => "Filter",
            NodeKind::Include {} => "Include",
            NodeKind::RawInclude {} => "RawInclude",
            NodeKind::Extends {} => "Extends",
            NodeKind::NamedBlock {} => "NamedBlock",
            NodeKind::MixinBlock {} => "MixinBlock",
            NodeKind::YieldBlock {} => "YieldBlock",
            NodeKind::InterpolatedTag {} => "InterpolatedTag",
        }
    }
}

/// `name=value` pair on a tag or mixin call. `val` is expression source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(deserialize_with = "expression_text")]
    pub val: String,
    #[serde(default = "default_escape", rename = "mustEscape")]
    pub must_escape: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            val: val.into(),
            must_escape: true,
        }
    }
}

/// Valueless attributes (`input(checked)`) arrive as a JSON `true`.
fn expression_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Flag(bool),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Flag(flag) => flag.to_string(),
    })
}

/// `&attributes(expr)` spread. Older parsers emit a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeBlock {
    Expression(String),
    Node { val: String },
}

impl AttributeBlock {
    pub fn expression(&self) -> &str {
        match self {
            AttributeBlock::Expression(val) | AttributeBlock::Node { val } => val,
        }
    }
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            line: 0,
            context: None,
        }
    }

    /// Decode a tree from the parser's JSON output.
    pub fn from_json(json: &str) -> AstResult<Self> {
        serde_json::from_str(json).map_err(AstError::from)
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn block(nodes: Vec<Node>) -> Self {
        Self::new(NodeKind::Block { nodes })
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Tag {
            name: name.into(),
            attrs: Vec::new(),
            attribute_blocks: Vec::new(),
            block: None,
        })
    }

    pub fn text(val: impl Into<String>) -> Self {
        Self::new(NodeKind::Text { val: val.into() })
    }

    pub fn code(val: impl Into<String>, buffer: bool, must_escape: bool) -> Self {
        Self::new(NodeKind::Code {
            val: val.into(),
            buffer,
            must_escape,
        })
    }

    pub fn conditional(test: impl Into<String>, consequent: Node, alternate: Option<Node>) -> Self {
        Self::new(NodeKind::Conditional {
            test: test.into(),
            consequent: Box::new(consequent),
            alternate: alternate.map(Box::new),
        })
    }

    pub fn each(obj: impl Into<String>, val: impl Into<String>, key: Option<&str>, block: Node) -> Self {
        Self::new(NodeKind::Each {
            obj: obj.into(),
            val: val.into(),
            key: key.map(str::to_string),
            block: Box::new(block),
        })
    }

    pub fn mixin(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Mixin {
            name: name.into(),
            args: None,
            attrs: Vec::new(),
            attribute_blocks: Vec::new(),
            block: None,
            call: true,
        })
    }

    pub fn comment(val: impl Into<String>) -> Self {
        Self::new(NodeKind::Comment { val: val.into() })
    }

    pub fn block_comment(val: impl Into<String>) -> Self {
        Self::new(NodeKind::BlockComment { val: val.into() })
    }

    /// Append an attribute to a tag or mixin call. Other kinds are unchanged.
    pub fn with_attr(mut self, name: impl Into<String>, val: impl Into<String>) -> Self {
        if let NodeKind::Tag { ref mut attrs, .. } | NodeKind::Mixin { ref mut attrs, .. } =
            self.kind
        {
            attrs.push(Attribute::new(name, val));
        }
        self
    }

    pub fn with_attribute_block(mut self, val: impl Into<String>) -> Self {
        if let NodeKind::Tag {
            ref mut attribute_blocks,
            ..
        }
        | NodeKind::Mixin {
            ref mut attribute_blocks,
            ..
        } = self.kind
        {
            attribute_blocks.push(AttributeBlock::Expression(val.into()));
        }
        self
    }

    pub fn with_args(mut self, val: impl Into<String>) -> Self {
        if let NodeKind::Mixin { ref mut args, .. } = self.kind {
            *args = Some(val.into());
        }
        self
    }

    /// Set the child block of a tag or mixin call.
    pub fn with_children(mut self, nodes: Vec<Node>) -> Self {
        if let NodeKind::Tag { ref mut block, .. } | NodeKind::Mixin { ref mut block, .. } =
            self.kind
        {
            *block = Some(Box::new(Node::block(nodes)));
        }
        self
    }

    /// Symbol name recorded in source maps (tag or mixin name).
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Tag { name, .. } | NodeKind::Mixin { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Wrap literal text as a template literal. `${...}` stays live.
pub fn text_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('`');
    for ch in text.chars() {
        match ch {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out.push('`');
    out
}
