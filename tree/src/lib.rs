//! Generic syntax tree handed to the translator by an external parser.
//!
//! A [`Node`] is a kind tag plus an ordered list of children. A child is a
//! token string, a nested node, or an absent optional slot. The layout of each
//! kind follows the grammar that produced the tree; the translator reads
//! children by position.
//!
//! Trees serialize to JSON as `{"kind": "...", "children": [...]}` where a
//! token is a JSON string and an absent slot is `null`.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod build;

/// One child slot of a [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Child {
    Node(Node),
    Token(String),
    Absent,
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<Option<Node>> for Child {
    fn from(node: Option<Node>) -> Self {
        match node {
            Some(node) => Child::Node(node),
            None => Child::Absent,
        }
    }
}

impl From<&str> for Child {
    fn from(token: &str) -> Self {
        Child::Token(token.to_string())
    }
}

impl From<String> for Child {
    fn from(token: String) -> Self {
        Child::Token(token)
    }
}

/// A tree node tagged with its grammar production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: String,
    #[serde(default)]
    pub children: Vec<Child>,
}

impl Node {
    pub fn new(kind: impl Into<String>, children: Vec<Child>) -> Self {
        Self {
            kind: kind.into(),
            children,
        }
    }

    pub fn leaf(kind: impl Into<String>) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn size(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    /// The nested node at `index`, if that slot holds one.
    pub fn node(&self, index: usize) -> Option<&Node> {
        match self.children.get(index) {
            Some(Child::Node(node)) => Some(node),
            _ => None,
        }
    }

    /// The token at `index`, if that slot holds one.
    pub fn token(&self, index: usize) -> Option<&str> {
        match self.children.get(index) {
            Some(Child::Token(token)) => Some(token),
            _ => None,
        }
    }

    /// True for an absent slot and for an index past the end.
    pub fn is_absent(&self, index: usize) -> bool {
        matches!(self.children.get(index), None | Some(Child::Absent))
    }

    /// All nested nodes, skipping tokens and absent slots.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|child| match child {
            Child::Node(node) => Some(node),
            _ => None,
        })
    }

    /// All tokens, skipping nested nodes and absent slots.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|child| match child {
            Child::Token(token) => Some(token.as_str()),
            _ => None,
        })
    }

    /// The first nested node of the given kind.
    pub fn find(&self, kind: &str) -> Option<&Node> {
        self.nodes().find(|node| node.has_kind(kind))
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match child {
                Child::Node(node) => write!(f, "{}", node)?,
                Child::Token(token) => write!(f, "{:?}", token)?,
                Child::Absent => write!(f, "null")?,
            }
        }
        write!(f, ")")
    }
}
