//! Build a [`ModelTree`] from a declarative TOML description.
//!
//! ```toml
//! [run]
//! steps = 30
//!
//! [simulation]
//! kind = "Simulation"
//! name = "Orchard"
//!
//! [[simulation.children]]
//! kind = "Clock"
//! start_step = 1
//! end_step = 30
//! ```
//!
//! A node table has `kind`, an optional `name` (defaults to the kind), an
//! optional `hidden` flag and an array of `children` tables. Every other key
//! is a parameter of the kind.

mod registry;

pub use registry::ModelRegistry;

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::core::config::RunConfig;
use crate::core::error::SimError;
use crate::core::types::NodeId;
use crate::tree::{is_valid_segment, ModelTree};

/// Errors that can occur when loading a model description
#[derive(Debug, Error)]
pub enum LoadError {
    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    /// File I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{path}: node has no 'kind'")]
    MissingKind { path: String },
    #[error("{path}: unknown model kind '{kind}'")]
    UnknownKind { path: String, kind: String },
    #[error("{path}: invalid parameters for {kind}: {message}")]
    InvalidParameters {
        path: String,
        kind: String,
        message: String,
    },
    #[error("{path}: field '{field}' {message}")]
    InvalidField {
        path: String,
        field: &'static str,
        message: String,
    },
    #[error("{path}: '{name}' is not a valid node name")]
    InvalidName { path: String, name: String },
    #[error("{path}: more than one child named '{name}'")]
    DuplicateName { path: String, name: String },
    #[error("Invalid run configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Tree(#[from] SimError),
}

/// A loaded description: the assembled tree and its run configuration
#[derive(Debug)]
pub struct LoadedSimulation {
    pub tree: ModelTree,
    pub config: RunConfig,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Description {
    #[serde(default)]
    run: RunConfig,
    simulation: toml::Table,
}

/// Loader that turns TOML descriptions into model trees
pub struct TreeLoader<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> TreeLoader<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Load a description from a TOML string
    pub fn load_str(&self, content: &str) -> Result<LoadedSimulation, LoadError> {
        let description: Description = toml::from_str(content)?;
        description.run.validate().map_err(LoadError::InvalidConfig)?;

        let mut tree = ModelTree::new();
        self.add_node(&mut tree, None, description.simulation)?;
        tracing::info!(nodes = tree.len(), "model tree loaded");
        Ok(LoadedSimulation {
            tree,
            config: description.run,
        })
    }

    /// Load a description from a TOML file on disk
    pub fn load_file(&self, path: &Path) -> Result<LoadedSimulation, LoadError> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading model description");
        self.load_str(&content)
    }

    fn add_node(
        &self,
        tree: &mut ModelTree,
        parent: Option<NodeId>,
        mut table: toml::Table,
    ) -> Result<NodeId, LoadError> {
        let parent_path = parent.map(|p| tree.path(p));
        let here = |name: &str| match &parent_path {
            Some(p) => format!("{}.{}", p, name),
            None => name.to_string(),
        };

        let kind = match table.remove("kind") {
            Some(toml::Value::String(kind)) => kind,
            Some(_) => {
                return Err(LoadError::InvalidField {
                    path: here("?"),
                    field: "kind",
                    message: "must be a string".into(),
                })
            }
            None => return Err(LoadError::MissingKind { path: here("?") }),
        };
        let name = match table.remove("name") {
            Some(toml::Value::String(name)) => name,
            Some(_) => {
                return Err(LoadError::InvalidField {
                    path: here(&kind),
                    field: "name",
                    message: "must be a string".into(),
                })
            }
            None => kind.clone(),
        };
        let path = here(&name);
        if !is_valid_segment(&name) {
            return Err(LoadError::InvalidName { path, name });
        }
        if let Some(parent) = parent {
            if tree.children(parent).iter().any(|c| tree.name(*c) == name) {
                return Err(LoadError::DuplicateName {
                    path: tree.path(parent),
                    name,
                });
            }
        }
        let hidden = match table.remove("hidden") {
            Some(toml::Value::Boolean(hidden)) => hidden,
            Some(_) => {
                return Err(LoadError::InvalidField {
                    path,
                    field: "hidden",
                    message: "must be a boolean".into(),
                })
            }
            None => false,
        };
        let children = match table.remove("children") {
            Some(toml::Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    toml::Value::Table(child) => Ok(child),
                    _ => Err(LoadError::InvalidField {
                        path: path.clone(),
                        field: "children",
                        message: "must contain only tables".into(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(LoadError::InvalidField {
                    path,
                    field: "children",
                    message: "must be an array of tables".into(),
                })
            }
            None => Vec::new(),
        };

        let factory = self
            .registry
            .factory(&kind)
            .ok_or_else(|| LoadError::UnknownKind {
                path: path.clone(),
                kind: kind.clone(),
            })?;
        let model = (factory.build)(table).map_err(|e| LoadError::InvalidParameters {
            path: path.clone(),
            kind: kind.clone(),
            message: e.message().to_string(),
        })?;

        let id = tree.insert_boxed(parent, name, model, factory.access)?;
        tree.set_hidden(id, hidden);
        tracing::trace!(path = %path, kind = %kind, "node added");

        for child in children {
            self.add_node(tree, Some(id), child)?;
        }
        Ok(id)
    }
}
