use std::collections::HashMap;
use std::time::Instant;

use strata_codec::CellValue;
use strata_model::{FamilyDescriptor, Row, Timestamp};

use crate::client::{Client, ClientError, ConnectConfig};
use crate::scan::FullScan;

/// Process-local facade over the companion process.
///
/// Owns one connection, logs and times every call, derives timestamps for
/// value-level writes, and applies the recovery policy: a lost connection
/// gets exactly one reconnect and one retry, and whatever the second
/// attempt returns is final. Precondition and argument errors are surfaced
/// immediately.
#[derive(Debug)]
pub struct Adapter {
    addr: String,
    config: ConnectConfig,
    client: Client,
}

impl Adapter {
    pub fn connect(addr: impl Into<String>, config: ConnectConfig) -> Result<Self, ClientError> {
        let addr = addr.into();
        let client = Client::connect(&addr, &config)?;
        Ok(Self {
            addr,
            config,
            client,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Drop the current session and open a fresh one.
    pub fn reconnect(&mut self) -> Result<(), ClientError> {
        self.client = Client::connect(&self.addr, &self.config)?;
        Ok(())
    }

    fn call<T>(
        &mut self,
        op: &'static str,
        table: &str,
        f: impl Fn(&mut Client) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let start = Instant::now();
        let mut result = f(&mut self.client);
        if result.as_ref().err().is_some_and(|e| e.is_lost_connection()) {
            tracing::warn!(op, table, addr = %self.addr, "connection lost, reconnecting");
            self.reconnect()?;
            result = f(&mut self.client);
        }
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(_) => tracing::debug!(op, table, elapsed_ms),
            Err(e) => tracing::debug!(op, table, elapsed_ms, error = %e),
        }
        result
    }

    // ── Schema operations ───────────────────────────────────────

    pub fn ping(&mut self) -> Result<(), ClientError> {
        self.call("ping", "", |c| c.ping())
    }

    pub fn table_exists(&mut self, table: &str) -> Result<bool, ClientError> {
        self.call("table_exists", table, |c| c.table_exists(table))
    }

    pub fn create_table(
        &mut self,
        table: &str,
        families: &[FamilyDescriptor],
    ) -> Result<(), ClientError> {
        self.call("create_table", table, |c| c.create_table(table, families))
    }

    pub fn drop_table(&mut self, table: &str) -> Result<(), ClientError> {
        self.call("drop_table", table, |c| c.drop_table(table))
    }

    pub fn truncate_table(&mut self, table: &str) -> Result<(), ClientError> {
        self.call("truncate_table", table, |c| c.truncate_table(table))
    }

    pub fn add_family(
        &mut self,
        table: &str,
        family: &FamilyDescriptor,
    ) -> Result<(), ClientError> {
        self.call("add_family", table, |c| c.add_family(table, family))
    }

    pub fn remove_family(&mut self, table: &str, family: &str) -> Result<(), ClientError> {
        self.call("remove_family", table, |c| c.remove_family(table, family))
    }

    pub fn modify_family(
        &mut self,
        table: &str,
        family: &FamilyDescriptor,
    ) -> Result<(), ClientError> {
        self.call("modify_family", table, |c| c.modify_family(table, family))
    }

    pub fn list_tables(&mut self) -> Result<Vec<String>, ClientError> {
        self.call("list_tables", "", |c| c.list_tables())
    }

    // ── Point operations ────────────────────────────────────────

    /// Write cells with the companion process's own clock as the version
    /// timestamp.
    pub fn update(
        &mut self,
        table: &str,
        row_id: &str,
        values: &[(String, Vec<u8>)],
    ) -> Result<String, ClientError> {
        self.call("update", table, |c| c.update(table, row_id, values, None))
    }

    /// Write cells at an explicit packed timestamp.
    pub fn update_at(
        &mut self,
        table: &str,
        row_id: &str,
        values: &[(String, Vec<u8>)],
        timestamp: Timestamp,
    ) -> Result<String, ClientError> {
        self.call("update", table, |c| {
            c.update(table, row_id, values, Some(timestamp))
        })
    }

    pub fn delete(&mut self, table: &str, row_id: &str) -> Result<(), ClientError> {
        self.call("delete", table, |c| c.delete(table, row_id))
    }

    /// Latest value of one cell, or `None` for an absent row or cell.
    pub fn get(
        &mut self,
        table: &str,
        row_id: &str,
        column: &str,
    ) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self
            .call("get", table, |c| c.get(table, row_id, column, 1, None))?
            .into_iter()
            .next())
    }

    /// Up to `versions` values of one cell, newest first, at or before
    /// `timestamp`.
    pub fn get_versions(
        &mut self,
        table: &str,
        row_id: &str,
        column: &str,
        versions: u32,
        timestamp: Option<Timestamp>,
    ) -> Result<Vec<Vec<u8>>, ClientError> {
        self.call("get", table, |c| {
            c.get(table, row_id, column, versions, timestamp)
        })
    }

    pub fn get_columns(
        &mut self,
        table: &str,
        row_id: &str,
        columns: &[String],
        timestamp: Option<Timestamp>,
    ) -> Result<Option<HashMap<String, Vec<u8>>>, ClientError> {
        self.call("get_columns", table, |c| {
            c.get_columns(table, row_id, columns, timestamp)
        })
    }

    // ── Value-level helpers ─────────────────────────────────────

    /// Write already-typed values, encoding each through the cell codec.
    pub fn update_values(
        &mut self,
        table: &str,
        row_id: &str,
        values: &[(String, CellValue)],
    ) -> Result<String, ClientError> {
        let encoded: Vec<(String, Vec<u8>)> = values
            .iter()
            .map(|(column, value)| (column.clone(), strata_codec::encode(value)))
            .collect();
        self.update(table, row_id, &encoded)
    }

    /// Latest value of one cell decoded through the cell codec. An absent
    /// row or cell reads as `Nil`.
    pub fn get_value(
        &mut self,
        table: &str,
        row_id: &str,
        column: &str,
    ) -> Result<CellValue, ClientError> {
        Ok(match self.get(table, row_id, column)? {
            Some(bytes) => strata_codec::decode(&bytes),
            None => CellValue::Nil,
        })
    }

    // ── Scans ───────────────────────────────────────────────────

    /// Bounded row scan: `start_row` inclusive, `stop_row` exclusive.
    pub fn scan(
        &mut self,
        table: &str,
        start_row: Option<&str>,
        stop_row: Option<&str>,
        columns: &[String],
        limit: Option<u64>,
    ) -> Result<Vec<Row>, ClientError> {
        self.call("scan", table, |c| {
            c.scan(table, start_row, stop_row, columns, limit)
        })
    }

    /// Lazily iterate the whole table in row-id order.
    pub fn full_scan(
        &mut self,
        table: &str,
        columns: &[String],
        batch_size: u64,
    ) -> FullScan<'_> {
        FullScan::new(self, table, columns, batch_size, None)
    }

    /// Like `full_scan`, but restarted from `start_row` (inclusive).
    pub fn full_scan_from(
        &mut self,
        table: &str,
        start_row: &str,
        columns: &[String],
        batch_size: u64,
    ) -> FullScan<'_> {
        FullScan::new(self, table, columns, batch_size, Some(start_row))
    }
}
