use thiserror::Error;

use crate::core::types::NodeId;

/// A required link slot that found no target during assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLink {
    /// Absolute path of the node declaring the link
    pub owner: String,
    /// Name of the link slot
    pub slot: String,
    /// Description of the requested capability or kind
    pub requested: String,
}

impl std::fmt::Display for UnresolvedLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: link '{}' could not find {}",
            self.owner, self.slot, self.requested
        )
    }
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("{} unresolved link(s): {}", .0.len(), join_links(.0))]
    UnresolvedLinks(Vec<UnresolvedLink>),

    #[error("Cannot find variable: {expression} in function: {node}")]
    MissingVariable { expression: String, node: String },

    #[error("{node}: {kind} expects {expected} function argument(s), found {got}")]
    Arity {
        node: String,
        kind: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("{node}: computation failed: {message}")]
    Computation { node: String, message: String },

    #[error("{node}: value is not a scalar in this configuration; it must be indexed")]
    NotScalar { node: String },

    #[error("{node}: variable {expression} is not numeric")]
    NotNumeric { expression: String, node: String },

    #[error("{node}: invalid configuration: {message}")]
    Configuration { node: String, message: String },

    #[error("{node}: link '{slot}' was used before links were resolved")]
    UnboundLink { node: String, slot: &'static str },

    #[error("{node}: unknown property '{property}'")]
    UnknownProperty { node: String, property: String },

    #[error("{node}: property '{property}' is read-only")]
    ReadOnlyProperty { node: String, property: String },

    #[error("{node}: property '{property}' expects {expected}")]
    PropertyType {
        node: String,
        property: String,
        expected: &'static str,
    },

    #[error("Invalid path expression '{expression}': {message}")]
    InvalidPath { expression: String, message: String },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("{node}: handler for event '{event}' failed: {source}")]
    Handler {
        event: String,
        node: String,
        #[source]
        source: Box<SimError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn join_links(links: &[UnresolvedLink]) -> String {
    links
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SimError {
    /// Unwrap handler wrappers down to the error that caused them
    pub fn root_cause(&self) -> &SimError {
        match self {
            SimError::Handler { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
