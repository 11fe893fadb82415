//! Integration tests for whole runs loaded from a description

use arbor::core::error::SimError;
use arbor::datastore::{DataStore, MemoryDataStore};
use arbor::lifecycle::events;
use arbor::loader::{LoadedSimulation, ModelRegistry, TreeLoader};
use arbor::models::SimpleTree;
use arbor::runner::Runner;
use arbor::tree::navigator;
use arbor::tree::Value;

const ORCHARD: &str = include_str!("../demos/orchard.toml");

fn load(content: &str) -> LoadedSimulation {
    let registry = ModelRegistry::with_builtins();
    TreeLoader::new(&registry).load_str(content).unwrap()
}

fn numbers(store: &MemoryDataStore, column: &str) -> Vec<f64> {
    store
        .table("Orchard", "Daily")
        .unwrap()
        .column(column)
        .unwrap()
        .into_iter()
        .map(|cell| cell.and_then(Value::as_f64).unwrap())
        .collect()
}

#[test]
fn test_orchard_run_writes_report_and_messages() {
    let loaded = load(ORCHARD);
    let mut runner = Runner::new(loaded.tree, loaded.config);
    let mut store = MemoryDataStore::new();
    let outcome = runner.run(&mut store).unwrap();

    assert_eq!(outcome.simulation, "Orchard");
    assert_eq!(outcome.steps_run, 10);
    assert!(outcome.failed_steps.is_empty());
    assert_eq!(store.table_names("Orchard"), vec!["Daily", "Messages"]);

    let daily = store.table("Orchard", "Daily").unwrap();
    assert_eq!(daily.len(), 10);
    assert_eq!(daily.columns[0], "Today");
    assert_eq!(numbers(&store, "Today"), (1..=10u32).map(f64::from).collect::<Vec<_>>());

    let stage = numbers(&store, "Phenology.Stage");
    assert_eq!(stage[0], 0.5);
    assert_eq!(stage[9], 5.0);

    let rue = numbers(&store, "Field.Tree.RUE.Value");
    assert_eq!(rue[0], 1.2);
    assert_eq!(rue[9], 0.9);

    // Uptake is capped by potential EP while the soil is wet
    let ep = numbers(&store, "Field.Tree.EP");
    assert!((ep[0] - 4.0).abs() < 1e-9);
    let top_water = numbers(&store, "Field.Soil.Water[0]");
    assert!(top_water.windows(2).all(|w| w[1] < w[0]));

    let growth = numbers(&store, "Field.Tree.Growth.Value");
    assert!(growth.iter().all(|g| *g > 0.0));

    let messages = store.table("Orchard", "Messages").unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages.rows[0][0], Some(Value::Text("Field.Tree".into())));
}

#[test]
fn test_step_failure_can_be_skipped() {
    let mut loaded = load(ORCHARD);
    loaded.config.halt_on_step_error = false;
    let mut runner = Runner::new(loaded.tree, loaded.config);
    runner.subscribe_fn(events::DO_DAILY_INITIALISATION, "probe", |ctx| {
        if ctx.step == 4 {
            navigator::require_number(ctx.tree, ctx.node, "Field.Tree.Leaf.Wt")?;
        }
        Ok(())
    });
    let mut store = MemoryDataStore::new();
    let outcome = runner.run(&mut store).unwrap();

    assert_eq!(outcome.failed_steps.len(), 1);
    assert_eq!(outcome.failed_steps[0].step, 4);
    assert!(outcome.failed_steps[0].message.contains("Field.Tree.Leaf.Wt"));
    // The failed step produced no report row
    assert_eq!(store.table("Orchard", "Daily").unwrap().len(), 9);
    // The failure is in the summary log next to the tree's message
    assert_eq!(store.table("Orchard", "Messages").unwrap().len(), 2);
}

#[test]
fn test_step_failure_halts_by_default() {
    let loaded = load(ORCHARD);
    let mut runner = Runner::new(loaded.tree, loaded.config);
    runner.subscribe_fn(events::END_OF_DAY, "probe", |ctx| {
        navigator::require_number(ctx.tree, ctx.node, "Nowhere.Value").map(|_| ())
    });
    let mut store = MemoryDataStore::new();
    let err = runner.run(&mut store).unwrap_err();
    match err.root_cause() {
        SimError::MissingVariable { expression, node } => {
            assert_eq!(expression, "Nowhere.Value");
            assert_eq!(node, "Orchard");
        }
        other => panic!("Expected MissingVariable, got {:?}", other),
    }
    assert!(store.table("Orchard", "Daily").is_none());
}

#[test]
fn test_rerun_resets_collected_state() {
    let loaded = load(ORCHARD);
    let mut runner = Runner::new(loaded.tree, loaded.config);
    let mut store = MemoryDataStore::new();
    let first = runner.run(&mut store).unwrap();
    let second = runner.run(&mut store).unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(store.table("Orchard", "Daily").unwrap().len(), 10);
    assert_eq!(store.table("Orchard", "Messages").unwrap().len(), 1);
}

#[test]
fn test_missing_links_are_reported_together() {
    let broken = ORCHARD
        .replace("kind = \"Clock\"", "kind = \"Folder\"")
        .replace("start_step = 1\nend_step = 10\n", "")
        .replace("kind = \"Soil\"", "kind = \"Folder\"")
        .replace(
            "thickness = [150.0, 150.0, 300.0, 300.0]\nwater = [45.0, 42.0, 80.0, 75.0]\nll15 = [15.0, 15.0, 30.0, 30.0]\n",
            "",
        );
    let loaded = load(&broken);
    let mut runner = Runner::new(loaded.tree, loaded.config);
    let mut store = MemoryDataStore::new();
    match runner.run(&mut store).unwrap_err() {
        SimError::UnresolvedLinks(links) => {
            let slots: Vec<(&str, &str)> = links
                .iter()
                .map(|l| (l.owner.as_str(), l.slot.as_str()))
                .collect();
            assert_eq!(
                slots,
                vec![
                    ("Orchard.Summary", "clock"),
                    ("Orchard.Daily", "clock"),
                    ("Orchard.Field.Tree", "soil"),
                ]
            );
        }
        other => panic!("Expected UnresolvedLinks, got {:?}", other),
    }
    // Nothing ran
    assert!(store.simulations().is_empty());
}

#[test]
fn test_tree_state_after_run() {
    let loaded = load(ORCHARD);
    let mut runner = Runner::new(loaded.tree, loaded.config);
    let mut store = MemoryDataStore::new();
    runner.run(&mut store).unwrap();

    let tree = runner.into_tree();
    let root = tree.root().unwrap();
    let field = navigator::child_named(&tree, root, "Field").unwrap();
    let plant = navigator::child_named(&tree, field, "Tree").unwrap();
    let simple = tree.model_as::<SimpleTree>(plant).unwrap();
    assert!(simple.ep > 0.0);
    assert_eq!(
        navigator::resolve(&tree, root, "Clock.Today"),
        Some(Value::Number(10.0))
    );
}
