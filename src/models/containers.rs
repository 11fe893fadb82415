//! Plain grouping nodes

use serde::Deserialize;

use crate::tree::{number, Model, Properties, Property, Value};

/// Root of a simulation; its name keys the data store tables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Simulation {}

impl Model for Simulation {
    fn kind(&self) -> &'static str {
        "Simulation"
    }
}

impl Properties for Simulation {
    fn property_table() -> &'static [Property<Self>] {
        &[]
    }
}

/// A spatial area within a simulation
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Zone {
    /// Area in hectares
    pub area: f64,
}

impl Default for Zone {
    fn default() -> Self {
        Self { area: 1.0 }
    }
}

impl Model for Zone {
    fn kind(&self) -> &'static str {
        "Zone"
    }
}

const ZONE_PROPERTIES: &[Property<Zone>] = &[Property::read_write(
    "Area",
    |z: &Zone| Value::Number(z.area),
    |z: &mut Zone, v: Value| {
        z.area = number(v)?;
        Ok(())
    },
)];

impl Properties for Zone {
    fn property_table() -> &'static [Property<Self>] {
        ZONE_PROPERTIES
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Folder {}

impl Model for Folder {
    fn kind(&self) -> &'static str {
        "Folder"
    }
}

impl Properties for Folder {
    fn property_table() -> &'static [Property<Self>] {
        &[]
    }
}
