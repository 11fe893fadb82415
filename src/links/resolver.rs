//! Link resolution pass.
//!
//! Runs in two phases: every slot in the tree is collected and resolved
//! against the unmodified tree, then, only if no required slot failed, all
//! bindings are applied. A failed pass leaves every model untouched.

use crate::core::error::{Result, SimError, UnresolvedLink};
use crate::core::types::NodeId;
use crate::links::{LinkScope, LinkSpec};
use crate::tree::navigator;
use crate::tree::ModelTree;

/// Outcome of a successful resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Slots bound to a node
    pub bound: usize,
    /// Optional slots left empty, as (owner path, slot)
    pub optional_unbound: Vec<(String, &'static str)>,
}

/// Find the node a slot on `owner` should bind to. A node never links to
/// itself.
pub fn find_link_target(tree: &ModelTree, owner: NodeId, spec: &LinkSpec) -> Option<NodeId> {
    let accept = |n: NodeId| {
        n != owner
            && spec.target.matches(tree, n)
            && spec.name.map_or(true, |name| tree.name(n) == name)
    };
    match spec.scope {
        LinkScope::Ancestor => navigator::nearest_ancestor_matching(tree, owner, accept),
        LinkScope::Sibling => navigator::nearest_sibling_matching(tree, owner, accept),
        LinkScope::Nearest => navigator::nearest_matching(tree, owner, false, accept),
        LinkScope::Child => tree.children(owner).iter().copied().find(|c| accept(*c)),
    }
}

/// Bind every declared link slot in the tree.
///
/// Returns every unresolved required link at once; optional misses are
/// bound to `None`.
pub fn resolve_links(tree: &mut ModelTree) -> Result<LinkReport> {
    let mut bindings: Vec<(NodeId, &'static str, Option<NodeId>)> = Vec::new();
    let mut unresolved = Vec::new();
    let mut report = LinkReport::default();

    for owner in tree.preorder() {
        let Some(model) = tree.model(owner) else {
            continue;
        };
        for spec in model.links() {
            match find_link_target(tree, owner, &spec) {
                Some(target) => {
                    tracing::debug!(
                        owner = %tree.path(owner),
                        slot = spec.slot,
                        target = %tree.path(target),
                        "link resolved"
                    );
                    bindings.push((owner, spec.slot, Some(target)));
                    report.bound += 1;
                }
                None if spec.required => unresolved.push(UnresolvedLink {
                    owner: tree.path(owner),
                    slot: spec.slot.to_string(),
                    requested: spec.describe(),
                }),
                None => {
                    bindings.push((owner, spec.slot, None));
                    report.optional_unbound.push((tree.path(owner), spec.slot));
                }
            }
        }
    }

    if !unresolved.is_empty() {
        for link in &unresolved {
            tracing::error!("{}", link);
        }
        return Err(SimError::UnresolvedLinks(unresolved));
    }

    for (owner, slot, target) in bindings {
        if let Some(model) = tree.model_mut(owner) {
            model.bind_link(slot, target);
        }
    }

    tracing::info!(
        bound = report.bound,
        optional_unbound = report.optional_unbound.len(),
        "links resolved"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Clock, Folder, Simulation, SimpleTree, Soil, Summary, Zone};
    use crate::tree::{Model, Properties, Property, Target};

    /// A model with one link slot of a configurable scope
    struct Dependent {
        scope: LinkScope,
        kind: &'static str,
        required: bool,
        bound: Option<NodeId>,
    }

    impl Dependent {
        fn required(scope: LinkScope, kind: &'static str) -> Self {
            Self {
                scope,
                kind,
                required: true,
                bound: None,
            }
        }

        fn optional(scope: LinkScope, kind: &'static str) -> Self {
            Self {
                required: false,
                ..Self::required(scope, kind)
            }
        }
    }

    impl Model for Dependent {
        fn kind(&self) -> &'static str {
            "Dependent"
        }

        fn links(&self) -> Vec<LinkSpec> {
            let target = Target::Kind(self.kind);
            if self.required {
                vec![LinkSpec::required("target", target, self.scope)]
            } else {
                vec![LinkSpec::optional("target", target, self.scope)]
            }
        }

        fn bind_link(&mut self, _slot: &str, target: Option<NodeId>) {
            self.bound = target;
        }
    }

    impl Properties for Dependent {
        fn property_table() -> &'static [Property<Self>] {
            &[]
        }
    }

    fn bound(tree: &ModelTree, id: NodeId) -> Option<String> {
        tree.model_as::<Dependent>(id)
            .and_then(|d| d.bound)
            .map(|n| tree.path(n))
    }

    fn soil() -> Soil {
        Soil::new(vec![100.0, 200.0], vec![20.0, 30.0]).unwrap()
    }

    #[test]
    fn test_binds_required_and_optional() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let clock = tree.add_child(root, "Clock", Clock::new(1, 3)).unwrap();
        let zone = tree.add_child(root, "Field", Zone::default()).unwrap();
        let soil_id = tree.add_child(zone, "Soil", soil()).unwrap();
        let plant = tree.add_child(zone, "Tree", SimpleTree::default()).unwrap();
        let summary = tree.add_child(root, "Summary", Summary::default()).unwrap();

        let report = resolve_links(&mut tree).unwrap();
        assert_eq!(tree.model_as::<SimpleTree>(plant).unwrap().soil(), Some(soil_id));
        assert_eq!(tree.model_as::<Summary>(summary).unwrap().clock(), Some(clock));
        assert!(report.bound >= 3);
    }

    #[test]
    fn test_optional_miss_is_not_an_error() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let zone = tree.add_child(root, "Field", Zone::default()).unwrap();
        tree.add_child(zone, "Soil", soil()).unwrap();
        tree.add_child(zone, "Tree", SimpleTree::default()).unwrap();

        let report = resolve_links(&mut tree).unwrap();
        assert!(report
            .optional_unbound
            .iter()
            .any(|(owner, slot)| owner == "Simulation.Field.Tree" && *slot == "summary"));
    }

    #[test]
    fn test_every_missing_required_link_reported() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let zone = tree.add_child(root, "Field", Zone::default()).unwrap();
        let first = tree.add_child(zone, "TreeA", SimpleTree::default()).unwrap();
        tree.add_child(zone, "TreeB", SimpleTree::default()).unwrap();
        tree.add_child(root, "Summary", Summary::default()).unwrap();

        let err = resolve_links(&mut tree).unwrap_err();
        let SimError::UnresolvedLinks(links) = err else {
            panic!("Expected UnresolvedLinks");
        };
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].owner, "Simulation.Field.TreeA");
        assert_eq!(links[0].slot, "soil");
        assert!(links.iter().any(|l| l.owner == "Simulation.Summary" && l.slot == "clock"));
        // Nothing was bound, not even the optional slots
        assert_eq!(tree.model_as::<SimpleTree>(first).unwrap().soil(), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        tree.add_child(root, "Clock", Clock::new(1, 3)).unwrap();
        tree.add_child(root, "Clock2", Clock::new(1, 3)).unwrap();
        let summary = tree.add_child(root, "Summary", Summary::default()).unwrap();

        resolve_links(&mut tree).unwrap();
        let first = tree.model_as::<Summary>(summary).unwrap().clock();
        resolve_links(&mut tree).unwrap();
        let second = tree.model_as::<Summary>(summary).unwrap().clock();
        assert_eq!(first, second);
        assert_eq!(first.map(|c| tree.path(c)), Some("Simulation.Clock".to_string()));
    }

    #[test]
    fn test_ancestor_scope_binds_enclosing_node_only() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let outer = tree.add_child(root, "Outer", Zone::default()).unwrap();
        let inner = tree.add_child(outer, "Inner", Zone::default()).unwrap();
        let owner = tree
            .add_child(inner, "Owner", Dependent::required(LinkScope::Ancestor, "Zone"))
            .unwrap();
        tree.add_child(inner, "Beside", Zone::default()).unwrap();

        resolve_links(&mut tree).unwrap();
        assert_eq!(bound(&tree, owner).as_deref(), Some("Simulation.Outer.Inner"));
    }

    #[test]
    fn test_ancestor_scope_ignores_siblings() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let owner = tree
            .add_child(root, "Owner", Dependent::required(LinkScope::Ancestor, "Zone"))
            .unwrap();
        tree.add_child(root, "Field", Zone::default()).unwrap();

        let spec = tree.model(owner).unwrap().links()[0];
        assert_eq!(find_link_target(&tree, owner, &spec), None);
        let err = resolve_links(&mut tree).unwrap_err();
        let SimError::UnresolvedLinks(links) = err else {
            panic!("Expected UnresolvedLinks");
        };
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].owner, "Simulation.Owner");
        assert_eq!(links[0].requested, "kind Zone (Ancestor scope)");
    }

    #[test]
    fn test_sibling_scope_skips_cousin_subtrees() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let field = tree.add_child(root, "Field", Zone::default()).unwrap();
        let group = tree.add_child(field, "Group", Folder::default()).unwrap();
        let owner = tree
            .add_child(group, "Owner", Dependent::required(LinkScope::Sibling, "Soil"))
            .unwrap();
        let other = tree.add_child(field, "Other", Folder::default()).unwrap();
        tree.add_child(other, "Deep", soil()).unwrap();
        tree.add_child(root, "Top", soil()).unwrap();

        // A nearest search would find the deeper cousin
        let mut spec = tree.model(owner).unwrap().links()[0];
        spec.scope = LinkScope::Nearest;
        assert_eq!(
            find_link_target(&tree, owner, &spec).map(|n| tree.path(n)),
            Some("Simulation.Field.Other.Deep".to_string())
        );

        resolve_links(&mut tree).unwrap();
        assert_eq!(bound(&tree, owner).as_deref(), Some("Simulation.Top"));
    }

    #[test]
    fn test_owner_never_binds_itself() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Simulation", Simulation::default()).unwrap();
        let outer = tree
            .add_child(root, "Outer", Dependent::optional(LinkScope::Ancestor, "Dependent"))
            .unwrap();
        let inner = tree
            .add_child(outer, "Inner", Dependent::required(LinkScope::Ancestor, "Dependent"))
            .unwrap();
        let left = tree
            .add_child(outer, "Left", Dependent::required(LinkScope::Sibling, "Dependent"))
            .unwrap();
        let lone = tree
            .add_child(root, "Lone", Dependent::optional(LinkScope::Sibling, "Dependent"))
            .unwrap();

        resolve_links(&mut tree).unwrap();
        assert_eq!(bound(&tree, outer), None);
        assert_eq!(bound(&tree, inner).as_deref(), Some("Simulation.Outer"));
        assert_eq!(bound(&tree, left).as_deref(), Some("Simulation.Outer.Inner"));
        // Lone's only sibling candidate is Outer, never itself
        assert_eq!(bound(&tree, lone).as_deref(), Some("Simulation.Outer"));
    }
}
