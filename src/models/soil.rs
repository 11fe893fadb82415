use serde::Deserialize;

use crate::core::error::{Result, SimError};
use crate::tree::{array, Model, Properties, Property, Value};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSoil {
    thickness: Vec<f64>,
    water: Vec<f64>,
    #[serde(default)]
    ll15: Vec<f64>,
}

impl TryFrom<RawSoil> for Soil {
    type Error = SimError;

    fn try_from(raw: RawSoil) -> Result<Self> {
        Soil::with_ll15(raw.thickness, raw.water, raw.ll15)
    }
}

/// Layered soil water store (mm per layer, layer thickness in mm)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSoil")]
pub struct Soil {
    thickness: Vec<f64>,
    water: Vec<f64>,
    ll15: Vec<f64>,
}

impl Soil {
    /// Soil with a zero lower limit in every layer
    pub fn new(thickness: Vec<f64>, water: Vec<f64>) -> Result<Self> {
        Self::with_ll15(thickness, water, Vec::new())
    }

    /// Soil with an explicit lower limit; an empty `ll15` means zero in
    /// every layer
    pub fn with_ll15(thickness: Vec<f64>, water: Vec<f64>, ll15: Vec<f64>) -> Result<Self> {
        let layers = thickness.len();
        let ll15 = if ll15.is_empty() { vec![0.0; layers] } else { ll15 };
        if water.len() != layers || ll15.len() != layers {
            return Err(SimError::Configuration {
                node: "Soil".into(),
                message: format!(
                    "{} layers in thickness but {} in water and {} in ll15",
                    layers,
                    water.len(),
                    ll15.len()
                ),
            });
        }
        if thickness.iter().any(|t| *t <= 0.0) {
            return Err(SimError::Configuration {
                node: "Soil".into(),
                message: "layer thickness must be positive".into(),
            });
        }
        Ok(Self {
            thickness,
            water,
            ll15,
        })
    }

    pub fn thickness(&self) -> &[f64] {
        &self.thickness
    }

    pub fn water(&self) -> &[f64] {
        &self.water
    }

    pub fn ll15(&self) -> &[f64] {
        &self.ll15
    }

    pub fn layers(&self) -> usize {
        self.thickness.len()
    }

    /// Remove `amounts[i]` mm from each layer, never going below zero
    pub fn remove_water(&mut self, amounts: &[f64]) {
        for (water, amount) in self.water.iter_mut().zip(amounts) {
            *water = (*water - amount).max(0.0);
        }
    }

    pub fn depth(&self) -> f64 {
        self.thickness.iter().sum()
    }
}

impl Model for Soil {
    fn kind(&self) -> &'static str {
        "Soil"
    }
}

const SOIL_PROPERTIES: &[Property<Soil>] = &[
    Property::read_only("Thickness", |s: &Soil| Value::Array(s.thickness.clone())),
    Property::read_write(
        "Water",
        |s: &Soil| Value::Array(s.water.clone()),
        |s: &mut Soil, v: Value| {
            let water = array(v)?;
            if water.len() != s.thickness.len() {
                return Err("one value per layer");
            }
            s.water = water;
            Ok(())
        },
    ),
    Property::read_only("LL15", |s: &Soil| Value::Array(s.ll15.clone())),
    Property::read_only("Depth", |s: &Soil| Value::Number(s.depth())),
];

impl Properties for Soil {
    fn property_table() -> &'static [Property<Self>] {
        SOIL_PROPERTIES
    }
}
