//! Arena storage for the model tree.
//!
//! Nodes live in a `Vec` addressed by [`NodeId`]. The parent link is an index
//! and children are an ordered index list, so ownership is flat: the arena
//! owns every node and dropping the tree drops them all. Only
//! [`ModelTree::add_child`] assigns a parent, which keeps the graph a strict
//! tree.

use ahash::AHashMap;
use std::any::TypeId;
use std::cell::RefCell;

use crate::core::error::{Result, SimError};
use crate::core::types::NodeId;
use crate::tree::model::{Model, Properties, PropertyAccess, PropertyFault};
use crate::tree::navigator;
use crate::tree::value::Value;

/// A node of the model tree
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    hidden: bool,
    /// `None` only while the model is detached for an event handler
    model: Option<Box<dyn Model>>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn model(&self) -> Option<&dyn Model> {
        self.model.as_deref()
    }
}

/// The model tree: an arena of nodes with a single root
#[derive(Default)]
pub struct ModelTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    /// Property accessors, registered per concrete model type
    properties: AHashMap<TypeId, PropertyAccess>,
    /// Function nodes currently being evaluated, outermost first
    evaluating: RefCell<Vec<NodeId>>,
}

/// Marks a node as under evaluation until dropped
pub(crate) struct EvaluationGuard<'a> {
    stack: &'a RefCell<Vec<NodeId>>,
}

impl Drop for EvaluationGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

impl ModelTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the root node. A tree has exactly one root.
    pub fn add_root<M: Model + Properties>(
        &mut self,
        name: impl Into<String>,
        model: M,
    ) -> Result<NodeId> {
        self.insert_boxed(None, name.into(), Box::new(model), PropertyAccess::of::<M>())
    }

    /// Adopt `model` as the last child of `parent`
    pub fn add_child<M: Model + Properties>(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        model: M,
    ) -> Result<NodeId> {
        self.insert_boxed(
            Some(parent),
            name.into(),
            Box::new(model),
            PropertyAccess::of::<M>(),
        )
    }

    pub(crate) fn insert_boxed(
        &mut self,
        parent: Option<NodeId>,
        name: String,
        model: Box<dyn Model>,
        access: PropertyAccess,
    ) -> Result<NodeId> {
        match parent {
            Some(parent) if !self.contains(parent) => return Err(SimError::NodeNotFound(parent)),
            None if self.root.is_some() => {
                return Err(SimError::Configuration {
                    node: name,
                    message: "tree already has a root".into(),
                })
            }
            _ => {}
        }

        let id = NodeId(self.nodes.len() as u32);
        self.properties
            .entry((*model).as_any().type_id())
            .or_insert(access);
        self.nodes.push(Node {
            name,
            parent,
            children: Vec::new(),
            hidden: false,
            model: Some(model),
        });

        match parent {
            Some(parent) => self.nodes[parent.index()].children.push(id),
            None => self.root = Some(id),
        }
        Ok(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Name of a node. Panics if `id` does not belong to this tree.
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].name
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        self.nodes[id.index()].name = name.into();
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Children not flagged hidden, for user-facing listings
    pub fn visible_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| !self.nodes[c.index()].hidden)
            .collect()
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.nodes[id.index()].hidden
    }

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        self.nodes[id.index()].hidden = hidden;
    }

    pub fn model(&self, id: NodeId) -> Option<&dyn Model> {
        self.nodes.get(id.index()).and_then(|n| n.model.as_deref())
    }

    pub fn model_mut(&mut self, id: NodeId) -> Option<&mut (dyn Model + 'static)> {
        self.nodes.get_mut(id.index())?.model.as_deref_mut()
    }

    /// Downcast a node's model to its concrete type
    pub fn model_as<M: Model + 'static>(&self, id: NodeId) -> Option<&M> {
        self.model(id)?.as_any().downcast_ref::<M>()
    }

    pub fn model_as_mut<M: Model + 'static>(&mut self, id: NodeId) -> Option<&mut M> {
        self.model_mut(id)?.as_any_mut().downcast_mut::<M>()
    }

    pub fn kind(&self, id: NodeId) -> Option<&'static str> {
        self.model(id).map(|m| m.kind())
    }

    /// Absolute dotted path of a node
    pub fn path(&self, id: NodeId) -> String {
        navigator::absolute_path(self, id)
    }

    /// All nodes in pre-order, starting at the root
    pub fn preorder(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => self.descendants(root),
            None => Vec::new(),
        }
    }

    /// `id` and everything below it, in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    fn access_for(&self, id: NodeId) -> Option<PropertyAccess> {
        let model = self.model(id)?;
        self.properties.get(&model.as_any().type_id()).copied()
    }

    /// Read a registered property of a node
    pub fn get_property(&self, id: NodeId, name: &str) -> Option<Value> {
        let access = self.access_for(id)?;
        (access.get)(self.model(id)?, name)
    }

    /// Write a registered property of a node
    pub fn set_property(&mut self, id: NodeId, name: &str, value: Value) -> Result<()> {
        let access = self.access_for(id).ok_or_else(|| SimError::UnknownProperty {
            node: self.path(id),
            property: name.to_string(),
        })?;
        let path = self.path(id);
        let model = self.model_mut(id).ok_or(SimError::NodeNotFound(id))?;
        (access.set)(model, name, value).map_err(|fault| match fault {
            PropertyFault::Unknown => SimError::UnknownProperty {
                node: path,
                property: name.to_string(),
            },
            PropertyFault::ReadOnly => SimError::ReadOnlyProperty {
                node: path,
                property: name.to_string(),
            },
            PropertyFault::Type(expected) => SimError::PropertyType {
                node: path,
                property: name.to_string(),
                expected,
            },
        })
    }

    /// Names in a node's property table
    pub fn property_names(&self, id: NodeId) -> Vec<&'static str> {
        self.access_for(id)
            .map(|access| (access.names)())
            .unwrap_or_default()
    }

    /// Take a node's model out of the arena while `f` runs, so `f` can hold
    /// the model mutably alongside the rest of the tree.
    ///
    /// While detached the node keeps its name and place in the tree, but its
    /// model and properties are invisible to queries.
    pub fn with_detached<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn Model, &mut ModelTree) -> R,
    ) -> Result<R> {
        let taken = self
            .nodes
            .get_mut(id.index())
            .ok_or(SimError::NodeNotFound(id))?
            .model
            .take();
        let Some(mut model) = taken else {
            return Err(SimError::Configuration {
                node: self.path(id),
                message: "model is already detached".into(),
            });
        };
        let result = f(model.as_mut(), self);
        self.nodes[id.index()].model = Some(model);
        Ok(result)
    }

    /// Push `id` onto the evaluation stack. A node that is already being
    /// evaluated depends on its own value, which is a configuration error
    /// naming the cycle.
    pub(crate) fn enter_evaluation(&self, id: NodeId) -> Result<EvaluationGuard<'_>> {
        let mut stack = self.evaluating.borrow_mut();
        if let Some(start) = stack.iter().position(|n| *n == id) {
            let cycle: Vec<String> = stack[start..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|n| self.path(*n))
                .collect();
            return Err(SimError::Configuration {
                node: self.path(id),
                message: format!("cyclic evaluation: {}", cycle.join(" -> ")),
            });
        }
        stack.push(id);
        Ok(EvaluationGuard {
            stack: &self.evaluating,
        })
    }
}

impl std::fmt::Debug for ModelTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelTree")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}
