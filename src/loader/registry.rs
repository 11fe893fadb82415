//! Kind name -> model factory.

use ahash::AHashMap;
use serde::de::DeserializeOwned;

use crate::functions::{
    AllometricDemand, Constant, LinearInterpolation, Multiply, PhaseLookup, PhaseLookupValue,
    Power, Sigmoid, SplineInterpolation, VariableReference, XyPairs,
};
use crate::models::{Clock, Folder, Phenology, Report, SimpleTree, Soil, Summary, Simulation, Zone};
use crate::tree::model::PropertyAccess;
use crate::tree::{Model, Properties};

type BuildFn = fn(toml::Table) -> Result<Box<dyn Model>, toml::de::Error>;

#[derive(Clone, Copy)]
pub(crate) struct Factory {
    pub build: BuildFn,
    pub access: PropertyAccess,
}

fn build<M>(params: toml::Table) -> Result<Box<dyn Model>, toml::de::Error>
where
    M: Model + Properties + DeserializeOwned,
{
    let model: M = toml::Value::Table(params).try_into()?;
    Ok(Box::new(model))
}

/// Registry of the model kinds a description may name
#[derive(Default)]
pub struct ModelRegistry {
    factories: AHashMap<String, Factory>,
}

impl ModelRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every model kind this crate provides
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register::<Simulation>("Simulation");
        registry.register::<Zone>("Zone");
        registry.register::<Folder>("Folder");
        registry.register::<Clock>("Clock");
        registry.register::<Summary>("Summary");
        registry.register::<Report>("Report");
        registry.register::<Soil>("Soil");
        registry.register::<Phenology>("Phenology");
        registry.register::<SimpleTree>("SimpleTree");

        registry.register::<Constant>("Constant");
        registry.register::<VariableReference>("VariableReference");
        registry.register::<Multiply>("Multiply");
        registry.register::<Power>("Power");
        registry.register::<Sigmoid>("Sigmoid");
        registry.register::<AllometricDemand>("AllometricDemand");
        registry.register::<PhaseLookup>("PhaseLookup");
        registry.register::<PhaseLookupValue>("PhaseLookupValue");
        registry.register::<XyPairs>("XYPairs");
        registry.register::<LinearInterpolation>("LinearInterpolation");
        registry.register::<SplineInterpolation>("SplineInterpolation");
        registry
    }

    /// Register (or replace) the factory for `kind`. Parameters are
    /// deserialized into `M` with serde.
    pub fn register<M>(&mut self, kind: impl Into<String>)
    where
        M: Model + Properties + DeserializeOwned,
    {
        self.factories.insert(
            kind.into(),
            Factory {
                build: build::<M>,
                access: PropertyAccess::of::<M>(),
            },
        );
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kind names, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub(crate) fn factory(&self, kind: &str) -> Option<Factory> {
        self.factories.get(kind).copied()
    }
}
