//! The `Model` trait and the per-kind property registry.
//!
//! A model is the payload of a tree node. It declares which roles it plays
//! by returning capability views (`as_function`, `as_phase_gate`,
//! `as_lookup`) and by listing the lifecycle events it subscribes to. Named
//! properties are exposed through a static [`Property`] table per concrete
//! type, registered with the tree when the first node of that type is added.

use std::any::Any;

use crate::core::error::Result;
use crate::core::types::NodeId;
use crate::functions::{Function, Lookup, PhaseGate};
use crate::lifecycle::EventContext;
use crate::links::LinkSpec;
use crate::tree::value::Value;

/// Roles a node may play, queried structurally by the navigator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Exposes a computed scalar (`Value()`)
    Function,
    /// Exposes an `InPhase` gate used by phase lookups
    PhaseGate,
    /// Produces a value for an explicit argument (`ValueAt(x)`)
    Lookup,
    /// Handles lifecycle events
    Subscriber,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::Function => "Function",
            Capability::PhaseGate => "PhaseGate",
            Capability::Lookup => "Lookup",
            Capability::Subscriber => "Subscriber",
        };
        write!(f, "{}", name)
    }
}

/// Upcast helper so `dyn Model` can be downcast to its concrete type
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Payload of a node in the model tree
pub trait Model: AsAny {
    /// Kind name used by type-based queries and links (e.g. `"Clock"`)
    fn kind(&self) -> &'static str;

    fn as_function(&self) -> Option<&dyn Function> {
        None
    }

    fn as_phase_gate(&self) -> Option<&dyn PhaseGate> {
        None
    }

    fn as_lookup(&self) -> Option<&dyn Lookup> {
        None
    }

    /// Dependency slots to be bound by the link resolver
    fn links(&self) -> Vec<LinkSpec> {
        Vec::new()
    }

    /// Bind a slot declared by [`Model::links`]. `None` means an optional
    /// link found no target.
    fn bind_link(&mut self, _slot: &str, _target: Option<NodeId>) {}

    /// Lifecycle events this model handles
    fn subscriptions(&self) -> &'static [&'static str] {
        &[]
    }

    fn handle_event(&mut self, _event: &str, _ctx: &mut EventContext<'_>) -> Result<()> {
        Ok(())
    }

    fn implements(&self, capability: Capability) -> bool {
        match capability {
            Capability::Function => self.as_function().is_some(),
            Capability::PhaseGate => self.as_phase_gate().is_some(),
            Capability::Lookup => self.as_lookup().is_some(),
            Capability::Subscriber => !self.subscriptions().is_empty(),
        }
    }
}

/// Typed setter; the error is the name of the expected value type
pub type Setter<M> = fn(&mut M, Value) -> std::result::Result<(), &'static str>;

/// One named property of a concrete model type
pub struct Property<M> {
    pub name: &'static str,
    pub get: fn(&M) -> Value,
    pub set: Option<Setter<M>>,
}

impl<M> Property<M> {
    pub const fn read_only(name: &'static str, get: fn(&M) -> Value) -> Self {
        Self {
            name,
            get,
            set: None,
        }
    }

    pub const fn read_write(name: &'static str, get: fn(&M) -> Value, set: Setter<M>) -> Self {
        Self {
            name,
            get,
            set: Some(set),
        }
    }
}

/// Static property table of a concrete model type
pub trait Properties: Sized + 'static {
    fn property_table() -> &'static [Property<Self>];
}

/// Setter helper: numeric value or the expected type name
pub fn number(value: Value) -> std::result::Result<f64, &'static str> {
    value.as_f64().ok_or("a number")
}

/// Setter helper: array value or the expected type name
pub fn array(value: Value) -> std::result::Result<Vec<f64>, &'static str> {
    match value {
        Value::Array(values) => Ok(values),
        _ => Err("an array of numbers"),
    }
}

/// Why a property write was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropertyFault {
    Unknown,
    ReadOnly,
    Type(&'static str),
}

/// Type-erased accessors for one concrete model type
#[derive(Clone, Copy)]
pub(crate) struct PropertyAccess {
    pub get: fn(&dyn Model, &str) -> Option<Value>,
    pub set: fn(&mut dyn Model, &str, Value) -> std::result::Result<(), PropertyFault>,
    pub names: fn() -> Vec<&'static str>,
}

impl PropertyAccess {
    pub fn of<M: Model + Properties>() -> Self {
        Self {
            get: get_erased::<M>,
            set: set_erased::<M>,
            names: names_of::<M>,
        }
    }
}

fn get_erased<M: Model + Properties>(model: &dyn Model, name: &str) -> Option<Value> {
    let model = model.as_any().downcast_ref::<M>()?;
    M::property_table()
        .iter()
        .find(|p| p.name == name)
        .map(|p| (p.get)(model))
}

fn set_erased<M: Model + Properties>(
    model: &mut dyn Model,
    name: &str,
    value: Value,
) -> std::result::Result<(), PropertyFault> {
    let model = model
        .as_any_mut()
        .downcast_mut::<M>()
        .ok_or(PropertyFault::Unknown)?;
    let property = M::property_table()
        .iter()
        .find(|p| p.name == name)
        .ok_or(PropertyFault::Unknown)?;
    let set = property.set.ok_or(PropertyFault::ReadOnly)?;
    set(model, value).map_err(PropertyFault::Type)
}

fn names_of<M: Model + Properties>() -> Vec<&'static str> {
    M::property_table().iter().map(|p| p.name).collect()
}
