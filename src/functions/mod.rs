//! Function nodes: models that expose a computed scalar.
//!
//! Evaluation is synchronous, pull-based and not memoized: every call walks
//! the child functions again, so values always reflect the current state of
//! their inputs. Evaluation only reads the tree.

pub mod allometric;
pub mod constant;
pub mod interpolation;
pub mod multiply;
pub mod phase_lookup;
pub mod power;
pub mod sigmoid;
pub mod spline;
pub mod variable_reference;
pub mod xy_pairs;

pub use allometric::AllometricDemand;
pub use constant::Constant;
pub use interpolation::LinearInterpolation;
pub use multiply::Multiply;
pub use phase_lookup::{PhaseLookup, PhaseLookupValue};
pub use power::Power;
pub use sigmoid::Sigmoid;
pub use spline::{CubicSpline, SplineInterpolation};
pub use variable_reference::VariableReference;
pub use xy_pairs::{linear_interp, XyPairs};

use crate::core::error::{Result, SimError};
use crate::core::types::NodeId;
use crate::tree::navigator;
use crate::tree::{Capability, ModelTree};

/// A node exposing `Value()`
pub trait Function {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64>;
}

/// A node exposing an `InPhase` gate
pub trait PhaseGate {
    fn in_phase(&self, scope: &EvalScope<'_>) -> Result<bool>;
}

/// A node that produces a value for an explicit argument
pub trait Lookup {
    fn value_at(&self, x: f64, scope: &EvalScope<'_>) -> Result<f64>;
}

/// Read-only view of the tree from the node being evaluated
#[derive(Clone, Copy)]
pub struct EvalScope<'a> {
    tree: &'a ModelTree,
    node: NodeId,
}

impl<'a> EvalScope<'a> {
    pub fn new(tree: &'a ModelTree, node: NodeId) -> Self {
        Self { tree, node }
    }

    pub fn tree(&self) -> &'a ModelTree {
        self.tree
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Absolute path of the node being evaluated
    pub fn path(&self) -> String {
        self.tree.path(self.node)
    }

    /// Scope for another node of the same tree
    pub fn at(&self, node: NodeId) -> EvalScope<'a> {
        EvalScope::new(self.tree, node)
    }

    /// Direct children that are functions, in order
    pub fn child_functions(&self) -> Vec<NodeId> {
        navigator::children_of_capability(self.tree, self.node, Capability::Function)
    }

    /// The single function child, or an arity error naming `kind`
    pub fn single_child_function(&self, kind: &'static str) -> Result<NodeId> {
        match self.child_functions().as_slice() {
            [only] => Ok(*only),
            others => Err(SimError::Arity {
                node: self.path(),
                kind,
                expected: "exactly 1",
                got: others.len(),
            }),
        }
    }

    pub fn evaluate(&self, node: NodeId) -> Result<f64> {
        evaluate(self.tree, node)
    }

    pub fn evaluate_at(&self, node: NodeId, x: f64) -> Result<f64> {
        evaluate_at(self.tree, node, x)
    }

    /// Numeric value of a mandatory path expression relative to this node
    pub fn require_number(&self, expression: &str) -> Result<f64> {
        navigator::require_number(self.tree, self.node, expression)
    }

    /// Target of a link slot, or an error if links were never resolved
    pub fn linked(&self, link: Option<NodeId>, slot: &'static str) -> Result<NodeId> {
        link.ok_or_else(|| SimError::UnboundLink {
            node: self.path(),
            slot,
        })
    }

    pub fn computation_error(&self, message: impl Into<String>) -> SimError {
        SimError::Computation {
            node: self.path(),
            message: message.into(),
        }
    }

    /// Reject NaN and infinite results
    pub fn finite(&self, value: f64, what: &str) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.computation_error(format!("{} produced {}", what, value)))
        }
    }
}

/// Evaluate the function at `node`
pub fn evaluate(tree: &ModelTree, node: NodeId) -> Result<f64> {
    let function = tree
        .model(node)
        .and_then(|m| m.as_function())
        .ok_or_else(|| SimError::Configuration {
            node: tree.path(node),
            message: "node is not a function".into(),
        })?;
    let _guard = tree.enter_evaluation(node)?;
    function.value(&EvalScope::new(tree, node))
}

/// Evaluate the lookup at `node` for argument `x`
pub fn evaluate_at(tree: &ModelTree, node: NodeId, x: f64) -> Result<f64> {
    let lookup = tree
        .model(node)
        .and_then(|m| m.as_lookup())
        .ok_or_else(|| SimError::Configuration {
            node: tree.path(node),
            message: "node cannot be evaluated at an argument".into(),
        })?;
    let _guard = tree.enter_evaluation(node)?;
    lookup.value_at(x, &EvalScope::new(tree, node))
}
