use ahash::AHashMap;

use crate::datastore::{DataStore, Table};

/// In-process data store
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    tables: AHashMap<String, AHashMap<String, Table>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulations with at least one table, sorted
    pub fn simulations(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .iter()
            .filter(|(_, tables)| !tables.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl DataStore for MemoryDataStore {
    fn write_table(&mut self, simulation: &str, name: &str, table: Table) {
        tracing::debug!(simulation, table = name, rows = table.len(), "table written");
        self.tables
            .entry(simulation.to_string())
            .or_default()
            .insert(name.to_string(), table);
    }

    fn delete_table(&mut self, simulation: &str, name: &str) {
        if let Some(tables) = self.tables.get_mut(simulation) {
            tables.remove(name);
        }
    }

    fn table(&self, simulation: &str, name: &str) -> Option<&Table> {
        self.tables.get(simulation)?.get(name)
    }

    fn table_names(&self, simulation: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .get(simulation)
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}
