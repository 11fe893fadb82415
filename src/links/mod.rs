//! Declarative dependency links between nodes.
//!
//! Models declare link slots through [`Model::links`](crate::tree::Model::links);
//! [`resolve_links`] binds them once the whole tree exists.

mod resolver;

pub use resolver::{find_link_target, resolve_links, LinkReport};

use crate::tree::navigator::Target;

/// Where to look for a link target, relative to the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkScope {
    /// The parent chain, nearest first
    Ancestor,
    /// Direct children of each ancestor (siblings of the owner, then
    /// siblings of its ancestors)
    Sibling,
    /// Owner's subtree, then outward through each ancestor's other children
    Nearest,
    /// Direct children of the owner
    Child,
}

/// One dependency slot declared by a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpec {
    pub slot: &'static str,
    pub target: Target,
    pub scope: LinkScope,
    pub required: bool,
    /// Restrict candidates to nodes with this name
    pub name: Option<&'static str>,
}

impl LinkSpec {
    pub fn required(slot: &'static str, target: Target, scope: LinkScope) -> Self {
        Self {
            slot,
            target,
            scope,
            required: true,
            name: None,
        }
    }

    pub fn optional(slot: &'static str, target: Target, scope: LinkScope) -> Self {
        Self {
            required: false,
            ..Self::required(slot, target, scope)
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Human-readable description of what the slot asks for
    pub fn describe(&self) -> String {
        match self.name {
            Some(name) => format!("{} named '{}' ({:?} scope)", self.target, name, self.scope),
            None => format!("{} ({:?} scope)", self.target, self.scope),
        }
    }
}
