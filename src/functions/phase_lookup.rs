//! Piecewise selection by crop phase.

use serde::Deserialize;

use crate::core::error::Result;
use crate::core::types::NodeId;
use crate::functions::{EvalScope, Function, PhaseGate};
use crate::links::{LinkScope, LinkSpec};
use crate::tree::{number, Model, Properties, Property, Target, Value};

/// Returns the value of the first child whose gate is open, or 0.0 when no
/// child is in phase. Function children without a gate are skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseLookup {}

impl Function for PhaseLookup {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        for child in scope.child_functions() {
            let Some(gate) = scope.tree().model(child).and_then(|m| m.as_phase_gate()) else {
                continue;
            };
            if gate.in_phase(&scope.at(child))? {
                return scope.evaluate(child);
            }
        }
        Ok(0.0)
    }
}

impl Model for PhaseLookup {
    fn kind(&self) -> &'static str {
        "PhaseLookup"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }
}

impl Properties for PhaseLookup {
    fn property_table() -> &'static [Property<Self>] {
        &[]
    }
}

/// A phase-gated function: open while the linked phenology stage lies in
/// `[start, end)`, valued by its single function child.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseLookupValue {
    pub start: f64,
    pub end: f64,
    #[serde(skip)]
    phenology: Option<NodeId>,
}

impl PhaseLookupValue {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            phenology: None,
        }
    }
}

impl PhaseGate for PhaseLookupValue {
    fn in_phase(&self, scope: &EvalScope<'_>) -> Result<bool> {
        let phenology = scope.linked(self.phenology, "phenology")?;
        let stage = scope
            .tree()
            .get_property(phenology, "Stage")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| scope.computation_error("phenology has no numeric Stage"))?;
        Ok(stage >= self.start && stage < self.end)
    }
}

impl Function for PhaseLookupValue {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        scope.evaluate(scope.single_child_function(self.kind())?)
    }
}

impl Model for PhaseLookupValue {
    fn kind(&self) -> &'static str {
        "PhaseLookupValue"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }

    fn as_phase_gate(&self) -> Option<&dyn PhaseGate> {
        Some(self)
    }

    fn links(&self) -> Vec<LinkSpec> {
        vec![LinkSpec::required(
            "phenology",
            Target::Kind("Phenology"),
            LinkScope::Nearest,
        )]
    }

    fn bind_link(&mut self, slot: &str, target: Option<NodeId>) {
        if slot == "phenology" {
            self.phenology = target;
        }
    }
}

const PHASE_LOOKUP_VALUE_PROPERTIES: &[Property<PhaseLookupValue>] = &[
    Property::read_write(
        "Start",
        |p: &PhaseLookupValue| Value::Number(p.start),
        |p: &mut PhaseLookupValue, v: Value| {
            p.start = number(v)?;
            Ok(())
        },
    ),
    Property::read_write(
        "End",
        |p: &PhaseLookupValue| Value::Number(p.end),
        |p: &mut PhaseLookupValue, v: Value| {
            p.end = number(v)?;
            Ok(())
        },
    ),
];

impl Properties for PhaseLookupValue {
    fn property_table() -> &'static [Property<Self>] {
        PHASE_LOOKUP_VALUE_PROPERTIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SimError;
    use crate::functions::{evaluate, Constant};
    use crate::links::resolve_links;
    use crate::models::{Phenology, Simulation};
    use crate::tree::ModelTree;

    /// Gate with a fixed answer
    struct FixedGate {
        open: bool,
        value: f64,
    }

    impl PhaseGate for FixedGate {
        fn in_phase(&self, _scope: &EvalScope<'_>) -> Result<bool> {
            Ok(self.open)
        }
    }

    impl Function for FixedGate {
        fn value(&self, _scope: &EvalScope<'_>) -> Result<f64> {
            Ok(self.value)
        }
    }

    impl Model for FixedGate {
        fn kind(&self) -> &'static str {
            "FixedGate"
        }

        fn as_function(&self) -> Option<&dyn Function> {
            Some(self)
        }

        fn as_phase_gate(&self) -> Option<&dyn PhaseGate> {
            Some(self)
        }
    }

    impl Properties for FixedGate {
        fn property_table() -> &'static [Property<Self>] {
            &[]
        }
    }

    fn lookup_with(gates: &[bool]) -> (ModelTree, NodeId) {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Lookup", PhaseLookup::default()).unwrap();
        for (i, open) in gates.iter().enumerate() {
            let gate = FixedGate {
                open: *open,
                value: (i + 1) as f64,
            };
            tree.add_child(root, format!("Phase{}", i), gate).unwrap();
        }
        (tree, root)
    }

    #[test]
    fn test_first_open_gate_wins() {
        let (tree, root) = lookup_with(&[false, true, false]);
        assert_eq!(evaluate(&tree, root).unwrap(), 2.0);
        let (tree, root) = lookup_with(&[false, true, true]);
        assert_eq!(evaluate(&tree, root).unwrap(), 2.0);
    }

    #[test]
    fn test_no_open_gate_defaults_to_zero() {
        let (tree, root) = lookup_with(&[false, false, false]);
        assert_eq!(evaluate(&tree, root).unwrap(), 0.0);
        let (tree, root) = lookup_with(&[]);
        assert_eq!(evaluate(&tree, root).unwrap(), 0.0);
    }

    #[test]
    fn test_ungated_children_are_skipped() {
        let (mut tree, root) = lookup_with(&[false]);
        tree.add_child(root, "Plain", Constant::new(9.0)).unwrap();
        assert_eq!(evaluate(&tree, root).unwrap(), 0.0);
    }

    fn phased_tree(stage: f64) -> (ModelTree, NodeId) {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        tree.add_child(root, "Phenology", Phenology::new(stage, 0.0)).unwrap();
        let lookup = tree.add_child(root, "RUE", PhaseLookup::default()).unwrap();
        let early = tree
            .add_child(lookup, "Early", PhaseLookupValue::new(0.0, 3.0))
            .unwrap();
        tree.add_child(early, "Value", Constant::new(1.2)).unwrap();
        let late = tree
            .add_child(lookup, "Late", PhaseLookupValue::new(3.0, 6.0))
            .unwrap();
        tree.add_child(late, "Value", Constant::new(0.8)).unwrap();
        resolve_links(&mut tree).unwrap();
        (tree, lookup)
    }

    #[test]
    fn test_stage_selects_phase() {
        let (tree, lookup) = phased_tree(1.5);
        assert_eq!(evaluate(&tree, lookup).unwrap(), 1.2);
        // End is exclusive
        let (tree, lookup) = phased_tree(3.0);
        assert_eq!(evaluate(&tree, lookup).unwrap(), 0.8);
        let (tree, lookup) = phased_tree(7.0);
        assert_eq!(evaluate(&tree, lookup).unwrap(), 0.0);
    }

    #[test]
    fn test_phase_value_needs_one_child() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        tree.add_child(root, "Phenology", Phenology::new(1.0, 0.0)).unwrap();
        let value = tree
            .add_child(root, "Empty", PhaseLookupValue::new(0.0, 2.0))
            .unwrap();
        resolve_links(&mut tree).unwrap();
        assert!(matches!(
            evaluate(&tree, value).unwrap_err(),
            SimError::Arity { got: 0, .. }
        ));
    }
}
