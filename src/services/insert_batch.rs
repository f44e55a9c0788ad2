//! Multi-row INSERT builder.
//!
//! Rows are buffered as plain values and the statement is only rendered by
//! [`InsertBatch::finalize_query`], so a batch of N rows costs one round trip
//! and the statement shape is defined in exactly one place.

use crate::errors::{MigrationError, MigrationResult};

#[derive(Debug)]
pub struct InsertBatch {
    table: &'static str,
    columns: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

impl InsertBatch {
    pub fn new(table: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            table,
            columns,
            rows: Vec::new(),
        }
    }

    /// Buffer one row. Its arity must match the column list.
    pub fn append(&mut self, row: Vec<String>) -> MigrationResult<()> {
        if row.len() != self.columns.len() {
            return Err(MigrationError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Render the statement with `?1..?N` placeholders and return it with the
    /// row-major argument list.
    ///
    /// Every value is a bound parameter and SQLite accepts at most 32766 per
    /// statement, so one batch of [`AttachmentRow`](crate::models::attachment::AttachmentRow)
    /// values holds at most 8191 rows. Larger batches fail at execution.
    pub fn finalize_query(self) -> MigrationResult<(String, Vec<String>)> {
        if self.rows.is_empty() {
            return Err(MigrationError::EmptyBatch);
        }

        let width = self.columns.len();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ",
            self.table,
            self.columns.join(", ")
        );
        for row in 0..self.rows.len() {
            if row > 0 {
                sql.push_str(", ");
            }
            let placeholders = (1..=width)
                .map(|col| format!("?{}", row * width + col))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push('(');
            sql.push_str(&placeholders);
            sql.push(')');
        }

        let args = self.rows.into_iter().flatten().collect();
        Ok((sql, args))
    }
}
