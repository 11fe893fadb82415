use serde::Deserialize;

use crate::core::error::Result;
use crate::functions::{EvalScope, Function};
use crate::tree::{number, Model, Properties, Property, Value};

/// Demand needed to bring a pool back to its allometric size:
/// `max(0, const * x^power - y)`, with `x` and `y` read by path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllometricDemand {
    #[serde(rename = "const")]
    pub constant: f64,
    pub power: f64,
    pub x_property: String,
    pub y_property: String,
}

impl Function for AllometricDemand {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        let x = scope.require_number(&self.x_property)?;
        let y = scope.require_number(&self.y_property)?;
        let target = scope.finite(self.constant * x.powf(self.power), "Allometric target")?;
        Ok((target - y).max(0.0))
    }
}

impl Model for AllometricDemand {
    fn kind(&self) -> &'static str {
        "AllometricDemand"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }
}

const ALLOMETRIC_PROPERTIES: &[Property<AllometricDemand>] = &[
    Property::read_write(
        "Const",
        |a: &AllometricDemand| Value::Number(a.constant),
        |a: &mut AllometricDemand, v: Value| {
            a.constant = number(v)?;
            Ok(())
        },
    ),
    Property::read_write(
        "Power",
        |a: &AllometricDemand| Value::Number(a.power),
        |a: &mut AllometricDemand, v: Value| {
            a.power = number(v)?;
            Ok(())
        },
    ),
    Property::read_only("XProperty", |a: &AllometricDemand| {
        Value::Text(a.x_property.clone())
    }),
    Property::read_only("YProperty", |a: &AllometricDemand| {
        Value::Text(a.y_property.clone())
    }),
];

impl Properties for AllometricDemand {
    fn property_table() -> &'static [Property<Self>] {
        ALLOMETRIC_PROPERTIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SimError;
    use crate::core::types::NodeId;
    use crate::functions::evaluate;
    use crate::models::{Simulation, SimpleTree};
    use crate::tree::ModelTree;

    fn build(x_property: &str, y_property: &str) -> (ModelTree, NodeId) {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let plant = tree
            .add_child(
                root,
                "Tree",
                SimpleTree::new(2.0, 100.0),
            )
            .unwrap();
        let demand = tree
            .add_child(
                plant,
                "Demand",
                AllometricDemand {
                    constant: 0.5,
                    power: 2.0,
                    x_property: x_property.to_string(),
                    y_property: y_property.to_string(),
                },
            )
            .unwrap();
        (tree, demand)
    }

    #[test]
    fn test_positive_demand() {
        // 0.5 * 100^2 - 2 = 4998
        let (tree, demand) = build("Tree.Height", "Tree.LAI");
        assert_eq!(evaluate(&tree, demand).unwrap(), 4998.0);
    }

    #[test]
    fn test_clamped_at_zero() {
        // 0.5 * 2^2 - 100 < 0
        let (tree, demand) = build("Tree.LAI", "Tree.Height");
        assert_eq!(evaluate(&tree, demand).unwrap(), 0.0);
    }

    #[test]
    fn test_missing_y_named_in_error() {
        let (tree, demand) = build("Tree.Height", "Tree.Leaf.Wt");
        match evaluate(&tree, demand).unwrap_err() {
            SimError::MissingVariable { expression, node } => {
                assert_eq!(expression, "Tree.Leaf.Wt");
                assert_eq!(node, "Simulation.Tree.Demand");
            }
            other => panic!("Expected MissingVariable, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_x_reported_first() {
        let (tree, demand) = build("Nothing.Here", "Tree.Missing");
        match evaluate(&tree, demand).unwrap_err() {
            SimError::MissingVariable { expression, .. } => assert_eq!(expression, "Nothing.Here"),
            other => panic!("Expected MissingVariable, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_const_key() {
        let demand: AllometricDemand = toml::from_str(
            r#"
const = 2.0
power = 1.5
x_property = "Tree.Height"
y_property = "Tree.LAI"
"#,
        )
        .unwrap();
        assert_eq!(demand.constant, 2.0);
        assert_eq!(demand.power, 1.5);
    }
}
