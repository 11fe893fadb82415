use serde::Deserialize;

use crate::core::error::Result;
use crate::functions::{EvalScope, Function};
use crate::tree::{number, Model, Properties, Property, Value};

/// Returns a fixed value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constant {
    pub value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Function for Constant {
    fn value(&self, _scope: &EvalScope<'_>) -> Result<f64> {
        Ok(self.value)
    }
}

impl Model for Constant {
    fn kind(&self) -> &'static str {
        "Constant"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }
}

const CONSTANT_PROPERTIES: &[Property<Constant>] = &[Property::read_write(
    "FixedValue",
    |c: &Constant| Value::Number(c.value),
    |c: &mut Constant, v: Value| {
        c.value = number(v)?;
        Ok(())
    },
)];

impl Properties for Constant {
    fn property_table() -> &'static [Property<Self>] {
        CONSTANT_PROPERTIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::evaluate;
    use crate::tree::ModelTree;

    #[test]
    fn test_fixed_value_is_writable() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("K", Constant::new(4.0)).unwrap();
        assert_eq!(evaluate(&tree, root).unwrap(), 4.0);
        tree.set_property(root, "FixedValue", Value::Number(7.5)).unwrap();
        assert_eq!(evaluate(&tree, root).unwrap(), 7.5);
    }
}
