//! Tabular output of path expressions, one row per step.

use serde::Deserialize;

use crate::core::error::Result;
use crate::core::types::NodeId;
use crate::datastore::Table;
use crate::lifecycle::{events, EventContext};
use crate::links::{LinkScope, LinkSpec};
use crate::tree::navigator;
use crate::tree::{Model, Properties, Property, Target, Value};

/// Resolves `variables` at the end of every step. On `Completed` the rows
/// are written to the data store under the report's node name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Report {
    pub variables: Vec<String>,
    #[serde(skip)]
    clock: Option<NodeId>,
    #[serde(skip)]
    rows: Vec<Vec<Option<Value>>>,
}

impl Report {
    pub fn new<S: Into<String>>(variables: impl IntoIterator<Item = S>) -> Self {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn to_table(&self) -> Table {
        let columns = std::iter::once("Today".to_string()).chain(self.variables.iter().cloned());
        let mut table = Table::new(columns);
        for row in &self.rows {
            table.push_row(row.clone());
        }
        table
    }

    fn collect_row(&mut self, ctx: &EventContext<'_>) {
        let today = self
            .clock
            .and_then(|clock| ctx.tree.get_property(clock, "Today"));
        let mut row = Vec::with_capacity(self.variables.len() + 1);
        row.push(today);
        for variable in &self.variables {
            let value = navigator::resolve(ctx.tree, ctx.node, variable);
            if value.is_none() {
                tracing::debug!(report = %ctx.path(), variable = %variable, "report variable absent");
            }
            row.push(value);
        }
        self.rows.push(row);
    }
}

impl Model for Report {
    fn kind(&self) -> &'static str {
        "Report"
    }

    fn links(&self) -> Vec<LinkSpec> {
        vec![LinkSpec::required(
            "clock",
            Target::Kind("Clock"),
            LinkScope::Nearest,
        )]
    }

    fn bind_link(&mut self, slot: &str, target: Option<NodeId>) {
        if slot == "clock" {
            self.clock = target;
        }
    }

    fn subscriptions(&self) -> &'static [&'static str] {
        &[events::COMMENCING, events::END_OF_DAY, events::COMPLETED]
    }

    fn handle_event(&mut self, event: &str, ctx: &mut EventContext<'_>) -> Result<()> {
        match event {
            events::COMMENCING => self.rows.clear(),
            events::END_OF_DAY => self.collect_row(ctx),
            events::COMPLETED => {
                let simulation = ctx.simulation_name();
                let name = ctx.tree.name(ctx.node).to_string();
                ctx.store.write_table(&simulation, &name, self.to_table());
                tracing::info!(report = %name, rows = self.rows.len(), "report written");
            }
            _ => {}
        }
        Ok(())
    }
}

const REPORT_PROPERTIES: &[Property<Report>] = &[Property::read_only("RowCount", |r: &Report| {
    Value::Number(r.rows.len() as f64)
})];

impl Properties for Report {
    fn property_table() -> &'static [Property<Self>] {
        REPORT_PROPERTIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::{DataStore, MemoryDataStore};
    use crate::lifecycle::LifecycleBus;
    use crate::links::resolve_links;
    use crate::models::{Clock, Phenology, Simulation};
    use crate::tree::ModelTree;

    #[test]
    fn test_rows_per_step_with_absent_cells() {
        let mut tree = ModelTree::new();
        let root = tree.add_root("Sim", Simulation::default()).unwrap();
        tree.add_child(root, "Clock", Clock::new(1, 5)).unwrap();
        tree.add_child(root, "Phenology", Phenology::new(0.0, 0.5)).unwrap();
        tree.add_child(
            root,
            "Report",
            Report::new(["Phenology.Stage", "Missing.Value"]),
        )
        .unwrap();
        resolve_links(&mut tree).unwrap();

        let mut bus = LifecycleBus::new();
        bus.subscribe_models(&tree);
        let mut store = MemoryDataStore::new();
        bus.dispatch(events::COMMENCING, &mut tree, 0, &mut store).unwrap();
        for step in 1..=2 {
            bus.dispatch(events::DO_DAILY_INITIALISATION, &mut tree, step, &mut store)
                .unwrap();
            bus.dispatch(events::END_OF_DAY, &mut tree, step, &mut store)
                .unwrap();
        }
        bus.dispatch(events::COMPLETED, &mut tree, 2, &mut store).unwrap();

        let table = store.table("Sim", "Report").unwrap();
        assert_eq!(table.columns, vec!["Today", "Phenology.Stage", "Missing.Value"]);
        assert_eq!(
            table.rows,
            vec![
                vec![Some(Value::Number(1.0)), Some(Value::Number(0.5)), None],
                vec![Some(Value::Number(2.0)), Some(Value::Number(1.0)), None],
            ]
        );
        assert_eq!(store.table_names("Sim"), vec!["Report"]);
    }
}
