//! Stateless queries over a [`ModelTree`]: children by capability, nearest
//! ancestor of a kind, scoped nearest search, absolute paths and path
//! expression resolution.

use crate::core::error::{Result, SimError};
use crate::core::types::NodeId;
use crate::tree::arena::ModelTree;
use crate::tree::model::Capability;
use crate::tree::path::PathExpr;
use crate::tree::value::Value;

/// Pseudo-property that evaluates a function node
pub const VALUE_PROPERTY: &str = "Value";

/// What a query or link is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Capability(Capability),
    Kind(&'static str),
}

impl Target {
    pub fn matches(&self, tree: &ModelTree, id: NodeId) -> bool {
        match (self, tree.model(id)) {
            (Target::Capability(cap), Some(model)) => model.implements(*cap),
            (Target::Kind(kind), Some(model)) => model.kind() == *kind,
            (_, None) => false,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Capability(cap) => write!(f, "capability {}", cap),
            Target::Kind(kind) => write!(f, "kind {}", kind),
        }
    }
}

/// Direct children implementing `capability`, in insertion order
pub fn children_of_capability(tree: &ModelTree, id: NodeId, capability: Capability) -> Vec<NodeId> {
    children_matching(tree, id, Target::Capability(capability))
}

/// Direct children of the given kind, in insertion order
pub fn children_of_kind(tree: &ModelTree, id: NodeId, kind: &'static str) -> Vec<NodeId> {
    children_matching(tree, id, Target::Kind(kind))
}

pub fn children_matching(tree: &ModelTree, id: NodeId, target: Target) -> Vec<NodeId> {
    tree.children(id)
        .iter()
        .copied()
        .filter(|c| target.matches(tree, *c))
        .collect()
}

/// First direct child with the given name
pub fn child_named(tree: &ModelTree, id: NodeId, name: &str) -> Option<NodeId> {
    tree.children(id)
        .iter()
        .copied()
        .find(|c| tree.name(*c) == name)
}

/// Ancestors of `id`, nearest first (excludes `id`)
pub fn ancestors(tree: &ModelTree, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(tree.parent(id), move |n| tree.parent(*n))
}

/// Walk the parent chain from `id.parent`, returning the first node of `kind`
pub fn nearest_ancestor_of_kind(tree: &ModelTree, id: NodeId, kind: &'static str) -> Option<NodeId> {
    nearest_ancestor_matching(tree, id, |n| Target::Kind(kind).matches(tree, n))
}

pub fn nearest_ancestor_matching(
    tree: &ModelTree,
    id: NodeId,
    mut pred: impl FnMut(NodeId) -> bool,
) -> Option<NodeId> {
    ancestors(tree, id).find(|n| pred(*n))
}

/// Nearest node implementing `capability`, `id` itself included.
///
/// The search covers `id`'s own subtree depth-first, then climbs: at each
/// ancestor the ancestor's other children (and their subtrees) are searched
/// before the ancestor itself. Closer scopes therefore always win.
pub fn nearest_of_capability(tree: &ModelTree, id: NodeId, capability: Capability) -> Option<NodeId> {
    nearest_matching(tree, id, true, |n| {
        Target::Capability(capability).matches(tree, n)
    })
}

pub fn nearest_of_kind(tree: &ModelTree, id: NodeId, kind: &'static str) -> Option<NodeId> {
    nearest_matching(tree, id, true, |n| Target::Kind(kind).matches(tree, n))
}

/// Scoped nearest search with an arbitrary predicate
pub fn nearest_matching(
    tree: &ModelTree,
    id: NodeId,
    include_self: bool,
    mut pred: impl FnMut(NodeId) -> bool,
) -> Option<NodeId> {
    let own = tree.descendants(id);
    let skip = usize::from(!include_self);
    if let Some(found) = own.into_iter().skip(skip).find(|n| pred(*n)) {
        return Some(found);
    }

    let mut came_from = id;
    let mut current = tree.parent(id);
    while let Some(ancestor) = current {
        for &child in tree.children(ancestor) {
            if child == came_from {
                continue;
            }
            if let Some(found) = tree.descendants(child).into_iter().find(|n| pred(*n)) {
                return Some(found);
            }
        }
        if pred(ancestor) {
            return Some(ancestor);
        }
        came_from = ancestor;
        current = tree.parent(ancestor);
    }
    None
}

/// Siblings of `id`, then siblings of each ancestor in turn, direct children
/// only, returning the first match.
pub fn nearest_sibling_matching(
    tree: &ModelTree,
    id: NodeId,
    mut pred: impl FnMut(NodeId) -> bool,
) -> Option<NodeId> {
    let mut came_from = id;
    let mut current = tree.parent(id);
    while let Some(ancestor) = current {
        if let Some(found) = tree
            .children(ancestor)
            .iter()
            .copied()
            .filter(|c| *c != came_from)
            .find(|c| pred(*c))
        {
            return Some(found);
        }
        came_from = ancestor;
        current = tree.parent(ancestor);
    }
    None
}

/// Names from the root down to `id`, joined with `.`
pub fn absolute_path(tree: &ModelTree, id: NodeId) -> String {
    let mut names: Vec<&str> = ancestors(tree, id).map(|n| tree.name(n)).collect();
    names.reverse();
    names.push(tree.name(id));
    names.join(".")
}

/// `id`'s path with the leading `context` path removed, for messages that are
/// scoped to a simulation
pub fn relative_path(tree: &ModelTree, id: NodeId, context: NodeId) -> String {
    let full = absolute_path(tree, id);
    let prefix = format!("{}.", absolute_path(tree, context));
    match full.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => full,
    }
}

/// Locate the node addressed by a sequence of names, relative to `start`.
///
/// The first name is looked up among `start`'s children, then among each
/// ancestor's children and the ancestor itself (nearest common context). If
/// no such name exists in the parent chain, a scoped nearest search by name
/// is used. Remaining names must match direct children.
pub fn find_by_names(tree: &ModelTree, start: NodeId, names: &[String]) -> Option<NodeId> {
    let Some((first, rest)) = names.split_first() else {
        return Some(start);
    };

    let head = child_named(tree, start, first)
        .or_else(|| {
            ancestors(tree, start).find_map(|ancestor| {
                child_named(tree, ancestor, first)
                    .or_else(|| (tree.name(ancestor) == first.as_str()).then_some(ancestor))
            })
        })
        .or_else(|| nearest_matching(tree, start, true, |n| tree.name(n) == first.as_str()))?;

    rest.iter()
        .try_fold(head, |node, name| child_named(tree, node, name))
}

/// Read a property of one node; `Value` on a function node evaluates it
pub fn read_property(tree: &ModelTree, id: NodeId, property: &str) -> Result<Option<Value>> {
    if let Some(value) = tree.get_property(id, property) {
        return Ok(Some(value));
    }
    if property == VALUE_PROPERTY {
        if tree.model(id).and_then(|m| m.as_function()).is_some() {
            return crate::functions::evaluate(tree, id).map(|v| Some(Value::Number(v)));
        }
    }
    Ok(None)
}

/// Resolve a path expression relative to `start`.
///
/// `Ok(None)` means some part of the path did not resolve (including a
/// malformed expression); `Err` is reserved for evaluation failures of a
/// function reached through the `Value` pseudo-property.
pub fn try_resolve(tree: &ModelTree, start: NodeId, expression: &str) -> Result<Option<Value>> {
    let Ok(path) = PathExpr::parse(expression) else {
        tracing::debug!(expression, "unparseable path expression");
        return Ok(None);
    };
    try_resolve_path(tree, start, &path)
}

pub fn try_resolve_path(tree: &ModelTree, start: NodeId, path: &PathExpr) -> Result<Option<Value>> {
    let value = if path.node_segments().is_empty() {
        let mut found = read_property(tree, start, path.property())?;
        if found.is_none() {
            for ancestor in ancestors(tree, start) {
                found = read_property(tree, ancestor, path.property())?;
                if found.is_some() {
                    break;
                }
            }
        }
        found
    } else {
        match find_by_names(tree, start, path.node_segments()) {
            Some(owner) => read_property(tree, owner, path.property())?,
            None => None,
        }
    };

    Ok(match (value, path.index()) {
        (Some(value), Some(index)) => value.index(index),
        (value, None) => value,
        (None, Some(_)) => None,
    })
}

/// Like [`try_resolve`] but any failure is reported as absent
pub fn resolve(tree: &ModelTree, start: NodeId, expression: &str) -> Option<Value> {
    match try_resolve(tree, start, expression) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(expression, error = %e, "path resolved to an evaluation error");
            None
        }
    }
}

/// Resolve a mandatory variable, turning absence into `MissingVariable`
pub fn require(tree: &ModelTree, start: NodeId, expression: &str) -> Result<Value> {
    try_resolve(tree, start, expression)?.ok_or_else(|| SimError::MissingVariable {
        expression: expression.to_string(),
        node: absolute_path(tree, start),
    })
}

/// Resolve a mandatory numeric variable
pub fn require_number(tree: &ModelTree, start: NodeId, expression: &str) -> Result<f64> {
    require(tree, start, expression)?
        .as_f64()
        .ok_or_else(|| SimError::NotNumeric {
            expression: expression.to_string(),
            node: absolute_path(tree, start),
        })
}
