use serde::Deserialize;

use crate::core::error::Result;
use crate::core::types::NodeId;
use crate::functions::{EvalScope, Function};
use crate::links::{LinkScope, LinkSpec};
use crate::tree::{number, Capability, Model, Properties, Property, Target, Value};

/// Logistic curve `ymax * 1 / (1 + exp(-(x - x0) / b))`.
///
/// `ymax` and `x` come from the child functions named `Ymax` and `XValue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sigmoid {
    pub x0: f64,
    pub b: f64,
    #[serde(skip)]
    ymax: Option<NodeId>,
    #[serde(skip)]
    x_value: Option<NodeId>,
}

impl Sigmoid {
    pub fn new(x0: f64, b: f64) -> Self {
        Self {
            x0,
            b,
            ..Self::default()
        }
    }
}

impl Function for Sigmoid {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        let ymax = scope.evaluate(scope.linked(self.ymax, "ymax")?)?;
        let x = scope.evaluate(scope.linked(self.x_value, "x")?)?;
        if self.b == 0.0 {
            return Err(scope.computation_error(
                "Error with values to Sigmoid function: division by zero (b = 0)",
            ));
        }
        let y = ymax * 1.0 / (1.0 + (-(x - self.x0) / self.b).exp());
        scope.finite(y, "Sigmoid function")
    }
}

impl Model for Sigmoid {
    fn kind(&self) -> &'static str {
        "Sigmoid"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }

    fn links(&self) -> Vec<LinkSpec> {
        let function = Target::Capability(Capability::Function);
        vec![
            LinkSpec::required("ymax", function, LinkScope::Child).named("Ymax"),
            LinkSpec::required("x", function, LinkScope::Child).named("XValue"),
        ]
    }

    fn bind_link(&mut self, slot: &str, target: Option<NodeId>) {
        match slot {
            "ymax" => self.ymax = target,
            "x" => self.x_value = target,
            _ => {}
        }
    }
}

const SIGMOID_PROPERTIES: &[Property<Sigmoid>] = &[
    Property::read_write(
        "Xo",
        |s: &Sigmoid| Value::Number(s.x0),
        |s: &mut Sigmoid, v: Value| {
            s.x0 = number(v)?;
            Ok(())
        },
    ),
    Property::read_write(
        "b",
        |s: &Sigmoid| Value::Number(s.b),
        |s: &mut Sigmoid, v: Value| {
            s.b = number(v)?;
            Ok(())
        },
    ),
];

impl Properties for Sigmoid {
    fn property_table() -> &'static [Property<Self>] {
        SIGMOID_PROPERTIES
    }
}
