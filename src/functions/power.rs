use serde::Deserialize;

use crate::core::error::Result;
use crate::functions::{EvalScope, Function};
use crate::tree::{number, Model, Properties, Property, Value};

/// Raises its single child function's value to a fixed exponent
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Power {
    #[serde(default = "default_exponent")]
    pub exponent: f64,
}

fn default_exponent() -> f64 {
    1.0
}

impl Default for Power {
    fn default() -> Self {
        Self {
            exponent: default_exponent(),
        }
    }
}

impl Power {
    pub fn new(exponent: f64) -> Self {
        Self { exponent }
    }
}

impl Function for Power {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        let base = scope.single_child_function(self.kind())?;
        Ok(scope.evaluate(base)?.powf(self.exponent))
    }
}

impl Model for Power {
    fn kind(&self) -> &'static str {
        "Power"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }
}

const POWER_PROPERTIES: &[Property<Power>] = &[Property::read_write(
    "Exponent",
    |p: &Power| Value::Number(p.exponent),
    |p: &mut Power, v: Value| {
        p.exponent = number(v)?;
        Ok(())
    },
)];

impl Properties for Power {
    fn property_table() -> &'static [Property<Self>] {
        POWER_PROPERTIES
    }
}
