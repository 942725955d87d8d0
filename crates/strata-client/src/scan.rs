use std::collections::VecDeque;

use strata_model::Row;

use crate::adapter::Adapter;
use crate::client::ClientError;

/// Lazy whole-table iteration driving repeated bounded scans.
///
/// Each round requests `batch_size + 1` rows from the cursor (inclusive).
/// On continuation rounds the first returned row is the boundary row being
/// fetched again and gets dropped; a raw batch shorter than `batch_size + 1`
/// marks the final page. The over-fetch keeps end-of-table detection cheap
/// without ever yielding a row twice.
pub struct FullScan<'a> {
    adapter: &'a mut Adapter,
    table: String,
    columns: Vec<String>,
    batch_size: u64,
    cursor: Option<String>,
    last_yielded: Option<String>,
    buffer: VecDeque<Row>,
    exhausted: bool,
    failed: bool,
}

impl<'a> FullScan<'a> {
    pub(crate) fn new(
        adapter: &'a mut Adapter,
        table: &str,
        columns: &[String],
        batch_size: u64,
        start_row: Option<&str>,
    ) -> Self {
        Self {
            adapter,
            table: table.to_string(),
            columns: columns.to_vec(),
            batch_size: batch_size.max(1),
            cursor: start_row.map(|s| s.to_string()),
            last_yielded: None,
            buffer: VecDeque::new(),
            exhausted: false,
            failed: false,
        }
    }

    /// Group rows into fixed-size batches for bulk pipelines. The final
    /// batch may be short.
    pub fn batches(self, size: usize) -> Batches<'a> {
        Batches {
            scan: self,
            size: size.max(1),
        }
    }

    fn fill(&mut self) -> Result<(), ClientError> {
        let mut rows = self.adapter.scan(
            &self.table,
            self.cursor.as_deref(),
            None,
            &self.columns,
            Some(self.batch_size + 1),
        )?;

        if (rows.len() as u64) < self.batch_size + 1 {
            self.exhausted = true;
        }
        if let (Some(last), Some(first)) = (&self.last_yielded, rows.first()) {
            if first.id == *last {
                rows.remove(0);
            }
        }
        if let Some(tail) = rows.last() {
            self.cursor = Some(tail.id.clone());
            self.last_yielded = Some(tail.id.clone());
        }
        self.buffer.extend(rows);
        Ok(())
    }
}

impl Iterator for FullScan<'_> {
    type Item = Result<Row, ClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                return Some(Ok(row));
            }
            if self.exhausted || self.failed {
                return None;
            }
            if let Err(e) = self.fill() {
                self.failed = true;
                return Some(Err(e));
            }
        }
    }
}

/// Fixed-size grouping over a `FullScan`.
pub struct Batches<'a> {
    scan: FullScan<'a>,
    size: usize,
}

impl Iterator for Batches<'_> {
    type Item = Result<Vec<Row>, ClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.scan.next() {
                Some(Ok(row)) => batch.push(row),
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }
        if batch.is_empty() { None } else { Some(Ok(batch)) }
    }
}
