use serde::Deserialize;

use crate::core::error::Result;
use crate::core::types::NodeId;
use crate::functions::{EvalScope, Function};
use crate::links::{LinkScope, LinkSpec};
use crate::tree::{Model, Properties, Property, Target, Value};

/// Table lookup: reads `x_property` by path and interpolates it through the
/// `XYPairs` child, clamped to the table's end points.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearInterpolation {
    pub x_property: String,
    #[serde(skip)]
    xy_pairs: Option<NodeId>,
}

impl LinearInterpolation {
    pub fn new(x_property: impl Into<String>) -> Self {
        Self {
            x_property: x_property.into(),
            xy_pairs: None,
        }
    }
}

impl Function for LinearInterpolation {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        let table = scope.linked(self.xy_pairs, "xy_pairs")?;
        let x = scope.require_number(&self.x_property)?;
        scope.evaluate_at(table, x)
    }
}

impl Model for LinearInterpolation {
    fn kind(&self) -> &'static str {
        "LinearInterpolation"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }

    fn links(&self) -> Vec<LinkSpec> {
        vec![LinkSpec::required(
            "xy_pairs",
            Target::Kind("XYPairs"),
            LinkScope::Child,
        )]
    }

    fn bind_link(&mut self, slot: &str, target: Option<NodeId>) {
        if slot == "xy_pairs" {
            self.xy_pairs = target;
        }
    }
}

const LINEAR_INTERPOLATION_PROPERTIES: &[Property<LinearInterpolation>] =
    &[Property::read_only("XProperty", |l: &LinearInterpolation| {
        Value::Text(l.x_property.clone())
    })];

impl Properties for LinearInterpolation {
    fn property_table() -> &'static [Property<Self>] {
        LINEAR_INTERPOLATION_PROPERTIES
    }
}
