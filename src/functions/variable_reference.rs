use serde::Deserialize;

use crate::core::error::Result;
use crate::functions::{EvalScope, Function};
use crate::tree::{Model, Properties, Property, Value};

/// Returns the numeric value found at a path expression
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableReference {
    pub variable_name: String,
}

impl VariableReference {
    pub fn new(variable_name: impl Into<String>) -> Self {
        Self {
            variable_name: variable_name.into(),
        }
    }
}

impl Function for VariableReference {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        scope.require_number(&self.variable_name)
    }
}

impl Model for VariableReference {
    fn kind(&self) -> &'static str {
        "VariableReference"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }
}

const VARIABLE_REFERENCE_PROPERTIES: &[Property<VariableReference>] =
    &[Property::read_only("VariableName", |v: &VariableReference| {
        Value::Text(v.variable_name.clone())
    })];

impl Properties for VariableReference {
    fn property_table() -> &'static [Property<Self>] {
        VARIABLE_REFERENCE_PROPERTIES
    }
}
