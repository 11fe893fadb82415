//! A minimal perennial crop: fixed canopy, water uptake from a linked soil.

use serde::Deserialize;

use crate::core::error::{Result, SimError};
use crate::core::types::NodeId;
use crate::lifecycle::{events, EventContext};
use crate::links::{LinkScope, LinkSpec};
use crate::models::summary::{self, MessageLevel};
use crate::models::Soil;
use crate::tree::{number, Model, Properties, Property, Target, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimpleTree {
    /// Leaf area index (m^2/m^2)
    pub lai: f64,
    /// Height (mm)
    pub height: f64,
    /// Root depth (mm)
    pub root_depth: f64,
    /// Nitrogen demand (kg/ha)
    pub n_demand: f64,
    /// Water the canopy could transpire in a step (mm)
    pub potential_ep: f64,
    /// Fraction of extractable water available per layer and step
    pub kl: f64,
    pub crop_type: String,
    /// Actual transpiration of the last step (mm)
    #[serde(skip)]
    pub ep: f64,
    #[serde(skip)]
    soil: Option<NodeId>,
    #[serde(skip)]
    summary: Option<NodeId>,
}

impl Default for SimpleTree {
    fn default() -> Self {
        Self {
            lai: 0.0,
            height: 0.0,
            root_depth: 0.0,
            n_demand: 0.0,
            potential_ep: 0.0,
            kl: 0.06,
            crop_type: "tree".into(),
            ep: 0.0,
            soil: None,
            summary: None,
        }
    }
}

impl SimpleTree {
    /// A tree with the given canopy and default parameters otherwise
    pub fn new(lai: f64, height: f64) -> Self {
        Self {
            lai,
            height,
            ..Self::default()
        }
    }

    pub fn soil(&self) -> Option<NodeId> {
        self.soil
    }

    pub fn summary(&self) -> Option<NodeId> {
        self.summary
    }

    pub fn cover_live(&self) -> f64 {
        1.0 - (-0.5 * self.lai).exp()
    }

    /// Fraction of the layer spanning `top..top + thickness` occupied by
    /// roots
    fn root_proportion(&self, top: f64, thickness: f64) -> f64 {
        if thickness <= 0.0 {
            return 0.0;
        }
        let rooted = (top + thickness).min(self.root_depth);
        (rooted - top).max(0.0) / thickness
    }

    /// Per-layer uptake: extractable water scaled so the total never
    /// exceeds `potential_ep`
    pub fn water_uptake(&self, soil: &Soil) -> Vec<f64> {
        let mut top = 0.0_f64;
        let potential: Vec<f64> = soil
            .thickness()
            .iter()
            .zip(soil.water())
            .zip(soil.ll15())
            .map(|((thickness, water), ll15)| {
                let proportion = self.root_proportion(top, *thickness);
                top += thickness;
                (proportion * self.kl * (water - ll15)).max(0.0)
            })
            .collect();
        let total: f64 = potential.iter().sum();
        if total <= 0.0 {
            return vec![0.0; potential.len()];
        }
        let scale = (self.potential_ep / total).min(1.0);
        potential.iter().map(|p| p * scale).collect()
    }

    fn take_up_water(&mut self, ctx: &mut EventContext<'_>) -> Result<()> {
        let soil_id = self.soil.ok_or_else(|| SimError::UnboundLink {
            node: ctx.path(),
            slot: "soil",
        })?;
        let soil = ctx
            .tree
            .model_as_mut::<Soil>(soil_id)
            .ok_or(SimError::NodeNotFound(soil_id))?;
        let uptake = self.water_uptake(soil);
        soil.remove_water(&uptake);
        self.ep = uptake.iter().sum();
        Ok(())
    }
}

impl Model for SimpleTree {
    fn kind(&self) -> &'static str {
        "SimpleTree"
    }

    fn links(&self) -> Vec<LinkSpec> {
        vec![
            LinkSpec::required("soil", Target::Kind("Soil"), LinkScope::Nearest),
            LinkSpec::optional("summary", Target::Kind("Summary"), LinkScope::Nearest),
        ]
    }

    fn bind_link(&mut self, slot: &str, target: Option<NodeId>) {
        match slot {
            "soil" => self.soil = target,
            "summary" => self.summary = target,
            _ => {}
        }
    }

    fn subscriptions(&self) -> &'static [&'static str] {
        &[events::COMMENCING, events::DO_DAILY_INITIALISATION]
    }

    fn handle_event(&mut self, event: &str, ctx: &mut EventContext<'_>) -> Result<()> {
        match event {
            events::COMMENCING => {
                self.ep = 0.0;
                if let Some(summary) = self.summary {
                    let text = format!(
                        "{} canopy: LAI = {}, cover = {:.3}, height = {} mm",
                        self.crop_type,
                        self.lai,
                        self.cover_live(),
                        self.height
                    );
                    summary::write(ctx, summary, MessageLevel::Information, text)?;
                }
                Ok(())
            }
            events::DO_DAILY_INITIALISATION => self.take_up_water(ctx),
            _ => Ok(()),
        }
    }
}

macro_rules! number_property {
    ($name:literal, $field:ident) => {
        Property::read_write(
            $name,
            |t: &SimpleTree| Value::Number(t.$field),
            |t: &mut SimpleTree, v: Value| {
                t.$field = number(v)?;
                Ok(())
            },
        )
    };
}

const SIMPLE_TREE_PROPERTIES: &[Property<SimpleTree>] = &[
    number_property!("LAI", lai),
    number_property!("Height", height),
    number_property!("RootDepth", root_depth),
    number_property!("NDemand", n_demand),
    number_property!("PotentialEP", potential_ep),
    number_property!("KL", kl),
    Property::read_only("CoverLive", |t: &SimpleTree| Value::Number(t.cover_live())),
    Property::read_only("EP", |t: &SimpleTree| Value::Number(t.ep)),
    Property::read_only("CropType", |t: &SimpleTree| Value::Text(t.crop_type.clone())),
];

impl Properties for SimpleTree {
    fn property_table() -> &'static [Property<Self>] {
        SIMPLE_TREE_PROPERTIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_live() {
        let tree = SimpleTree {
            lai: 2.0,
            ..SimpleTree::default()
        };
        assert!((tree.cover_live() - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
        assert_eq!(SimpleTree::default().cover_live(), 0.0);
    }

    #[test]
    fn test_uptake_limited_by_roots_and_demand() {
        let soil = Soil::with_ll15(
            vec![100.0, 100.0, 100.0],
            vec![30.0, 30.0, 30.0],
            vec![10.0, 10.0, 10.0],
        )
        .unwrap();
        let plant = SimpleTree {
            root_depth: 150.0,
            kl: 0.1,
            potential_ep: 100.0,
            ..SimpleTree::default()
        };
        // Layer 1 fully rooted, layer 2 half, layer 3 none
        let uptake = plant.water_uptake(&soil);
        assert!((uptake[0] - 2.0).abs() < 1e-12);
        assert!((uptake[1] - 1.0).abs() < 1e-12);
        assert_eq!(uptake[2], 0.0);

        let thirsty_less = SimpleTree {
            potential_ep: 1.5,
            ..plant
        };
        let total: f64 = thirsty_less.water_uptake(&soil).iter().sum();
        assert!((total - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_roots_deeper_than_profile() {
        let soil = Soil::new(vec![100.0], vec![30.0]).unwrap();
        let plant = SimpleTree {
            root_depth: 200.0,
            kl: 0.1,
            potential_ep: 5.0,
            ..SimpleTree::default()
        };
        let uptake = plant.water_uptake(&soil);
        assert_eq!(uptake.len(), 1);
        assert!((uptake[0] - 3.0).abs() < 1e-12);
        assert_eq!(plant.root_proportion(0.0, 0.0), 0.0);
    }
}
