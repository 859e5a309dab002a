/// Category of an attribute, decided by the first character of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind<'a> {
    /// `(click)=...`: listener for the inner event name
    Event(&'a str),
    /// `[value]=...`: live property, inner name is a key path
    Property(&'a str),
    /// anything else
    Attribute(&'a str),
}

impl<'a> AttributeKind<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            AttributeKind::Event(name)
            | AttributeKind::Property(name)
            | AttributeKind::Attribute(name) => name,
        }
    }
}

/// Classify an attribute name.
///
/// Total over all names: every name lands in exactly one category.
pub fn classify(name: &str) -> AttributeKind<'_> {
    if let Some(rest) = name.strip_prefix('(') {
        AttributeKind::Event(rest.strip_suffix(')').unwrap_or(rest))
    } else if let Some(rest) = name.strip_prefix('[') {
        AttributeKind::Property(rest.strip_suffix(']').unwrap_or(rest))
    } else {
        AttributeKind::Attribute(name)
    }
}

/// Split a property key path: `style.color` and `data[id]` both nest.
pub fn key_path(name: &str) -> Vec<&str> {
    name.split(|ch| ch == '.' || ch == '[' || ch == ']')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Nested object rebuilt from flat key paths.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyTree<T> {
    Leaf(T),
    Branch(Vec<(String, KeyTree<T>)>),
}

/// Rebuild nested objects from `(key path, value)` pairs.
///
/// Keys keep first-insertion order. When two paths collide the later one
/// wins, whether it replaces a leaf or a whole branch.
pub fn unflatten<T>(entries: impl IntoIterator<Item = (String, T)>) -> Vec<(String, KeyTree<T>)> {
    let mut root: Vec<(String, KeyTree<T>)> = Vec::new();

    for (name, value) in entries {
        let path = key_path(&name);
        let Some((last, parents)) = path.split_last() else {
            continue;
        };

        let mut level = &mut root;
        for segment in parents {
            let index = match level.iter().position(|(key, _)| key == segment) {
                Some(index) => {
                    if matches!(level[index].1, KeyTree::Leaf(_)) {
                        level[index].1 = KeyTree::Branch(Vec::new());
                    }
                    index
                }
                None => {
                    level.push((segment.to_string(), KeyTree::Branch(Vec::new())));
                    level.len() - 1
                }
            };
            level = match &mut level[index].1 {
                KeyTree::Branch(children) => children,
                KeyTree::Leaf(_) => unreachable!("leaf replaced by branch above"),
            };
        }

        match level.iter().position(|(key, _)| key == last) {
            Some(index) => level[index].1 = KeyTree::Leaf(value),
            None => level.push((last.to_string(), KeyTree::Leaf(value))),
        }
    }

    root
}
