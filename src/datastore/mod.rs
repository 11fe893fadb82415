//! Output tables and the data store they are written to.
//!
//! The store is an opaque collaborator: models write whole tables keyed by
//! simulation name and table name. Persistence is left to implementations.

mod memory;

pub use memory::MemoryDataStore;

use serde::{Deserialize, Serialize};

use crate::tree::Value;

/// Sink (and source) for tables produced during a run
pub trait DataStore {
    /// Store `table`, replacing any table of the same name for `simulation`
    fn write_table(&mut self, simulation: &str, name: &str, table: Table);

    fn delete_table(&mut self, simulation: &str, name: &str);

    fn table(&self, simulation: &str, name: &str) -> Option<&Table>;

    /// Names of the tables stored for `simulation`, sorted
    fn table_names(&self, simulation: &str) -> Vec<String>;
}

/// Column-named rows; `None` is a missing cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<Option<Value>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every cell of a named column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<Option<&Value>>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[index].as_ref()).collect())
    }

    /// Tab-separated rendering with a header line; missing cells are empty
    pub fn to_text(&self) -> String {
        let mut out = self.columns.join("\t");
        for row in &self.rows {
            out.push('\n');
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.as_ref().map(|v| v.to_string()).unwrap_or_default())
                .collect();
            out.push_str(&cells.join("\t"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_pads_to_columns() {
        let mut table = Table::new(["Step", "LAI"]);
        table.push_row(vec![Some(Value::Number(1.0))]);
        assert_eq!(table.rows[0], vec![Some(Value::Number(1.0)), None]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_column_lookup() {
        let mut table = Table::new(["Step", "LAI"]);
        table.push_row(vec![Some(Value::Number(1.0)), Some(Value::Number(0.5))]);
        table.push_row(vec![Some(Value::Number(2.0)), None]);
        let lai = table.column("LAI").unwrap();
        assert_eq!(lai, vec![Some(&Value::Number(0.5)), None]);
        assert!(table.column("Height").is_none());
    }

    #[test]
    fn test_text_rendering() {
        let mut table = Table::new(["Step", "Note"]);
        table.push_row(vec![Some(Value::Number(1.0)), None]);
        assert_eq!(table.to_text(), "Step\tNote\n1\t");
    }

    #[test]
    fn test_json_shape() {
        let mut table = Table::new(["Step"]);
        table.push_row(vec![Some(Value::Number(3.0))]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"columns":["Step"],"rows":[[3.0]]}"#);
    }
}
