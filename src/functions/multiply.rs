use serde::Deserialize;

use crate::core::error::Result;
use crate::functions::{EvalScope, Function};
use crate::tree::{Model, Properties, Property};

/// Product of all child function values; 1.0 with no children
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Multiply {}

impl Function for Multiply {
    fn value(&self, scope: &EvalScope<'_>) -> Result<f64> {
        scope
            .child_functions()
            .into_iter()
            .try_fold(1.0, |product, child| scope.evaluate(child).map(|v| product * v))
    }
}

impl Model for Multiply {
    fn kind(&self) -> &'static str {
        "Multiply"
    }

    fn as_function(&self) -> Option<&dyn Function> {
        Some(self)
    }
}

impl Properties for Multiply {
    fn property_table() -> &'static [Property<Self>] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SimError;
    use crate::functions::{evaluate, Constant, XyPairs};
    use crate::tree::ModelTree;

    #[test]
    fn test_no_children_is_identity() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Product", Multiply::default()).unwrap();
        assert_eq!(evaluate(&tree, root).unwrap(), 1.0);
    }

    #[test]
    fn test_product_of_children() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Product", Multiply::default()).unwrap();
        for (name, v) in [("A", 2.0), ("B", 3.0), ("C", 5.0)] {
            tree.add_child(root, name, Constant::new(v)).unwrap();
        }
        assert_eq!(evaluate(&tree, root).unwrap(), 30.0);
    }

    #[test]
    fn test_nested_products_and_negative_values() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Outer", Multiply::default()).unwrap();
        let inner = tree.add_child(root, "Inner", Multiply::default()).unwrap();
        tree.add_child(inner, "A", Constant::new(-2.0)).unwrap();
        tree.add_child(inner, "B", Constant::new(4.0)).unwrap();
        tree.add_child(root, "C", Constant::new(0.5)).unwrap();
        assert_eq!(evaluate(&tree, root).unwrap(), -4.0);
    }

    #[test]
    fn test_child_failure_propagates() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Product", Multiply::default()).unwrap();
        tree.add_child(root, "A", Constant::new(2.0)).unwrap();
        tree.add_child(root, "Table", XyPairs::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap())
            .unwrap();
        let err = evaluate(&tree, root).unwrap_err();
        assert!(matches!(err, SimError::NotScalar { .. }));
    }

    #[test]
    fn test_reflects_current_inputs() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Product", Multiply::default()).unwrap();
        let a = tree.add_child(root, "A", Constant::new(2.0)).unwrap();
        tree.add_child(root, "B", Constant::new(3.0)).unwrap();
        assert_eq!(evaluate(&tree, root).unwrap(), 6.0);
        tree.model_as_mut::<Constant>(a).unwrap().value = 10.0;
        assert_eq!(evaluate(&tree, root).unwrap(), 30.0);
    }
}
