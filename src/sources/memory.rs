use std::collections::HashMap;

use crate::error::Result;
use crate::rows::{Row, RowIter, RowSource, SourceTable};

/// A row source backed by plain vectors, for tests and programmatic
/// imports. Tables that were never inserted are absent, which is how
/// fixtures exercise the completeness check.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<SourceTable, Vec<Row>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: SourceTable, rows: Vec<Row>) -> Self {
        self.tables.insert(table, rows);
        self
    }

    pub fn insert(&mut self, table: SourceTable, rows: Vec<Row>) {
        self.tables.insert(table, rows);
    }
}

impl RowSource for MemorySource {
    fn has_table(&self, table: SourceTable) -> bool {
        self.tables.contains_key(&table)
    }

    fn open(&self, table: SourceTable) -> Result<RowIter<'_>> {
        let rows = self.tables.get(&table).cloned().unwrap_or_default();
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}
