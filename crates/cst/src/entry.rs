//! The opaque CST, and the proxy used to pull one in from whatever
//! grammar/parser collaborator produced it.

use crate::path::EMPTY_TAG;
use serde::{Deserialize, Serialize};

/// The capabilities a concrete CST node must expose before it can be folded
/// into an owned [`Entry`] tree. A real grammar/parser crate implements this
/// once per node type; this crate only ever consumes the result.
pub trait EntryProxy<T> {
    fn tag(&self, node: &T) -> String;
    fn has_children(&self, node: &T) -> bool;
    fn children(&self, node: &T) -> Vec<T>;
    fn is_terminal(&self, node: &T) -> bool;
    fn value(&self, node: &T) -> Option<String>;
    fn is_empty(&self, node: &T) -> bool;
}

/// An owned, language-agnostic CST node. Grammar-specific detail stops at
/// the proxy boundary; everything downstream of this type is grammar-blind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub tag: String,
    pub children: Vec<Entry>,
    pub is_terminal: bool,
    pub value: Option<String>,
    pub is_empty: bool,
}

impl Entry {
    /// Builds an owned `Entry` tree from an external node via its proxy.
    /// An empty entry's reported tag is forced to [`EMPTY_TAG`] regardless
    /// of what the grammar called the (unmatched) rule.
    pub fn from_proxy<T>(root: &T, proxy: &impl EntryProxy<T>) -> Entry {
        let is_empty = proxy.is_empty(root);
        let tag = if is_empty {
            EMPTY_TAG.to_string()
        } else {
            proxy.tag(root)
        };
        let children = if proxy.has_children(root) {
            proxy
                .children(root)
                .iter()
                .map(|child| Entry::from_proxy(child, proxy))
                .collect()
        } else {
            Vec::new()
        };
        Entry {
            tag,
            children,
            is_terminal: proxy.is_terminal(root),
            value: proxy.value(root),
            is_empty,
        }
    }

    /// A leaf entry carrying a raw token value (identifiers, literals,
    /// operator glyphs).
    pub fn leaf(tag: impl Into<String>, value: impl Into<String>) -> Entry {
        Entry {
            tag: tag.into(),
            children: Vec::new(),
            is_terminal: true,
            value: Some(value.into()),
            is_empty: false,
        }
    }

    /// An interior entry with no value of its own.
    pub fn node(tag: impl Into<String>, children: Vec<Entry>) -> Entry {
        Entry {
            tag: tag.into(),
            children,
            is_terminal: false,
            value: None,
            is_empty: false,
        }
    }

    /// An entry standing in for an optional grammar slot that matched
    /// nothing.
    pub fn empty() -> Entry {
        Entry {
            tag: EMPTY_TAG.to_string(),
            children: Vec::new(),
            is_terminal: true,
            value: None,
            is_empty: true,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Finds the first child whose tag equals `tag`.
    pub fn child(&self, tag: &str) -> Option<&Entry> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Every child whose tag equals `tag`, in order.
    pub fn children_tagged(&self, tag: &str) -> Vec<&Entry> {
        self.children.iter().filter(|c| c.tag == tag).collect()
    }

    pub fn nth(&self, index: usize) -> Option<&Entry> {
        self.children.get(index)
    }
}
