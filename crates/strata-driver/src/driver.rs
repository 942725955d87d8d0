use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use strata_model::{ColumnAddress, FamilyDescriptor, ROW_ID_KEY, Row, TableSchema, Timestamp};
use strata_store::{Store, Transaction};

use crate::catalog::{Catalog, META_CF};
use crate::encoding;
use crate::error::DriverError;

/// The wide-column driver: versioned cells, column address resolution,
/// ranged scans, and table/family DDL over any `strata_store` backend.
///
/// One `Driver` lives inside the companion process and serves every
/// connection. Point writes cover all columns of one row in a single store
/// transaction, which is the per-row atomicity the caller relies on.
pub struct Driver<S: Store> {
    store: S,
    /// Table-handle cache: schema by name, populated lazily, invalidated
    /// per-table by DDL and wholesale after a backend reconnect.
    handles: RwLock<HashMap<String, Arc<TableSchema>>>,
}

impl<S: Store> Driver<S> {
    pub fn open(store: S) -> Result<Self, DriverError> {
        store.create_cf(META_CF)?;
        Ok(Self {
            store,
            handles: RwLock::new(HashMap::new()),
        })
    }

    // ── Point operations ────────────────────────────────────────

    /// Write one version of each given cell at a single timestamp.
    /// Omitted timestamps take this process's current wall clock.
    pub fn update(
        &self,
        table: &str,
        row_id: &str,
        values: &[(String, Vec<u8>)],
        timestamp: Option<Timestamp>,
    ) -> Result<String, DriverError> {
        let schema = self.schema(table)?;
        validate_row_id(row_id)?;

        // Resolve every address before touching the store.
        let mut cells = Vec::with_capacity(values.len());
        for (column, value) in values {
            let addr = ColumnAddress::parse(column)?;
            let Some(qualifier) = addr.qualifier() else {
                return Err(DriverError::InvalidArgument(format!(
                    "update requires a fully qualified column, got {column:?}"
                )));
            };
            let family = self.require_family(&schema, addr.family())?;
            cells.push((
                addr.family().to_string(),
                qualifier.to_string(),
                value,
                family.max_versions as usize,
            ));
        }
        let ts = timestamp.unwrap_or_else(Timestamp::now);

        let txn = self.store.begin(false)?;
        let cf = txn.cf(table)?;
        for (family, qualifier, value, max_versions) in &cells {
            txn.put(&cf, &encoding::cell_key(row_id, family, qualifier, ts), value)?;

            // Prune surplus versions, oldest first. Versions sort newest
            // first under the cell prefix, so everything past max_versions
            // goes.
            let prefix = encoding::cell_prefix(row_id, family, qualifier);
            let surplus: Vec<Vec<u8>> = txn
                .scan_prefix(&cf, &prefix)?
                .skip(*max_versions)
                .map(|r| r.map(|(k, _)| k))
                .collect::<Result<_, _>>()?;
            for key in surplus {
                txn.delete(&cf, &key)?;
            }
        }
        txn.commit()?;
        Ok(row_id.to_string())
    }

    /// Remove every cell of a row. Removing an absent row is a no-op.
    pub fn delete(&self, table: &str, row_id: &str) -> Result<(), DriverError> {
        let _ = self.schema(table)?;
        let txn = self.store.begin(false)?;
        let cf = txn.cf(table)?;
        let keys: Vec<Vec<u8>> = txn
            .scan_prefix(&cf, &encoding::row_prefix(row_id))?
            .map(|r| r.map(|(k, _)| k))
            .collect::<Result<_, _>>()?;
        for key in &keys {
            txn.delete(&cf, key)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Read up to `versions` values of one cell, newest first, considering
    /// only cells written at or before `timestamp`. An absent row or cell
    /// yields the empty result.
    pub fn get(
        &self,
        table: &str,
        row_id: &str,
        column: &str,
        versions: u32,
        timestamp: Option<Timestamp>,
    ) -> Result<Vec<Vec<u8>>, DriverError> {
        if versions == 0 {
            return Err(DriverError::InvalidArgument(
                "versions must be at least 1".to_string(),
            ));
        }
        let schema = self.schema(table)?;
        let addr = ColumnAddress::parse(column)?;
        let Some(qualifier) = addr.qualifier() else {
            return Err(DriverError::InvalidArgument(format!(
                "get requires a fully qualified column, got {column:?}"
            )));
        };
        self.require_family(&schema, addr.family())?;

        let txn = self.store.begin(true)?;
        let cf = txn.cf(table)?;
        let mut out = Vec::new();
        for result in txn.scan_prefix(&cf, &encoding::cell_prefix(row_id, addr.family(), qualifier))? {
            let (key, value) = result?;
            let Some(cell) = encoding::parse_cell_key(&key) else {
                continue;
            };
            if let Some(bound) = timestamp {
                if cell.timestamp > bound {
                    continue;
                }
            }
            out.push(value);
            if out.len() == versions as usize {
                break;
            }
        }
        let _ = txn.rollback();
        Ok(out)
    }

    /// Resolve each address (expanding family wildcards at read time) to the
    /// latest value at or before `timestamp`. The row's own identifier is
    /// injected under the reserved `id` key. `None` when nothing is visible.
    pub fn get_columns(
        &self,
        table: &str,
        row_id: &str,
        columns: &[String],
        timestamp: Option<Timestamp>,
    ) -> Result<Option<HashMap<String, Vec<u8>>>, DriverError> {
        let schema = self.schema(table)?;
        let addrs = self.parse_addresses(&schema, columns)?;

        let txn = self.store.begin(true)?;
        let cf = txn.cf(table)?;
        let mut cells: HashMap<String, Vec<u8>> = HashMap::new();
        for addr in &addrs {
            match addr {
                ColumnAddress::Qualified { family, qualifier } => {
                    let prefix = encoding::cell_prefix(row_id, family, qualifier);
                    for result in txn.scan_prefix(&cf, &prefix)? {
                        let (key, value) = result?;
                        let Some(cell) = encoding::parse_cell_key(&key) else {
                            continue;
                        };
                        if visible(cell.timestamp, timestamp) {
                            cells.insert(format!("{family}:{qualifier}"), value);
                            break;
                        }
                    }
                }
                ColumnAddress::Wildcard { family } => {
                    // Entries group by qualifier, newest first within each;
                    // take the first visible version per qualifier.
                    let mut taken: Option<String> = None;
                    let prefix = encoding::family_prefix(row_id, family);
                    for result in txn.scan_prefix(&cf, &prefix)? {
                        let (key, value) = result?;
                        let Some(cell) = encoding::parse_cell_key(&key) else {
                            continue;
                        };
                        if taken.as_deref() == Some(cell.qualifier) {
                            continue;
                        }
                        if visible(cell.timestamp, timestamp) {
                            cells.insert(format!("{family}:{}", cell.qualifier), value);
                            taken = Some(cell.qualifier.to_string());
                        }
                    }
                }
            }
        }
        let _ = txn.rollback();

        if cells.is_empty() {
            return Ok(None);
        }
        cells.insert(ROW_ID_KEY.to_string(), row_id.as_bytes().to_vec());
        Ok(Some(cells))
    }

    // ── Scans ───────────────────────────────────────────────────

    /// Bounded row scan: `start_row` inclusive, `stop_row` exclusive,
    /// `limit` caps the row count. Rows come back strictly increasing by
    /// row id, each carrying the latest version of its matching cells.
    /// An empty `columns` list means every cell of the row.
    pub fn scan(
        &self,
        table: &str,
        start_row: Option<&str>,
        stop_row: Option<&str>,
        columns: &[String],
        limit: Option<u64>,
    ) -> Result<Vec<Row>, DriverError> {
        let schema = self.schema(table)?;
        let filters = self.parse_addresses(&schema, columns)?;
        let limit = limit.map(|l| l as usize);
        if limit == Some(0) {
            return Ok(Vec::new());
        }

        let txn = self.store.begin(true)?;
        let cf = txn.cf(table)?;
        let start = start_row.map(|s| s.as_bytes().to_vec());
        let end = stop_row.map(|s| s.as_bytes().to_vec());

        let mut rows: Vec<Row> = Vec::new();
        let mut current: Option<Row> = None;
        let mut last_cell: Option<(String, String)> = None;
        let mut at_limit = false;
        for result in txn.scan_range(&cf, start.as_deref(), end.as_deref())? {
            let (key, value) = result?;
            let Some(cell) = encoding::parse_cell_key(&key) else {
                continue;
            };

            if current.as_ref().is_none_or(|r| r.id != cell.row_id) {
                if let Some(row) = current.take() {
                    if !row.cells.is_empty() {
                        rows.push(row);
                        if limit.is_some_and(|l| rows.len() >= l) {
                            at_limit = true;
                            break;
                        }
                    }
                }
                current = Some(Row::new(cell.row_id));
                last_cell = None;
            }

            // Skip older versions of a cell already captured for this row.
            let cell_id = (cell.family, cell.qualifier);
            if last_cell
                .as_ref()
                .map(|(f, q)| (f.as_str(), q.as_str()))
                == Some(cell_id)
            {
                continue;
            }
            last_cell = Some((cell.family.to_string(), cell.qualifier.to_string()));

            if matches_filters(&filters, cell.family, cell.qualifier) {
                if let Some(row) = current.as_mut() {
                    row.cells
                        .insert(format!("{}:{}", cell.family, cell.qualifier), value);
                }
            }
        }
        if !at_limit {
            if let Some(row) = current {
                if !row.cells.is_empty() {
                    rows.push(row);
                }
            }
        }
        let _ = txn.rollback();
        Ok(rows)
    }

    // ── Schema operations ───────────────────────────────────────

    pub fn table_exists(&self, table: &str) -> Result<bool, DriverError> {
        if self.handles.read().unwrap().contains_key(table) {
            return Ok(true);
        }
        let txn = self.store.begin(true)?;
        let meta = txn.cf(META_CF)?;
        let exists = Catalog.load(&txn, &meta, table)?.is_some();
        let _ = txn.rollback();
        Ok(exists)
    }

    pub fn create_table(
        &self,
        name: &str,
        families: Vec<FamilyDescriptor>,
    ) -> Result<(), DriverError> {
        validate_table_name(name)?;
        for (i, family) in families.iter().enumerate() {
            validate_family(family)?;
            if families[..i].iter().any(|f| f.name == family.name) {
                return Err(DriverError::InvalidArgument(format!(
                    "duplicate family: {}",
                    family.name
                )));
            }
        }

        let mut txn = self.store.begin(false)?;
        let meta = txn.cf(META_CF)?;
        if Catalog.load(&txn, &meta, name)?.is_some() {
            return Err(DriverError::TableAlreadyExists(name.to_string()));
        }
        Catalog.save(&txn, &meta, &TableSchema::new(name, families))?;
        txn.create_cf(name)?;
        txn.commit()?;
        Ok(())
    }

    pub fn drop_table(&self, name: &str) -> Result<(), DriverError> {
        let mut txn = self.store.begin(false)?;
        let meta = txn.cf(META_CF)?;
        if Catalog.load(&txn, &meta, name)?.is_none() {
            return Err(DriverError::TableNotFound(name.to_string()));
        }
        Catalog.remove(&txn, &meta, name)?;
        txn.drop_cf(name)?;
        txn.commit()?;
        self.invalidate(name);
        Ok(())
    }

    /// Drop and recreate the table's data, keeping its schema.
    pub fn truncate_table(&self, name: &str) -> Result<(), DriverError> {
        let _ = self.schema(name)?;
        let mut txn = self.store.begin(false)?;
        txn.drop_cf(name)?;
        txn.create_cf(name)?;
        txn.commit()?;
        Ok(())
    }

    pub fn add_family(&self, table: &str, family: FamilyDescriptor) -> Result<(), DriverError> {
        validate_family(&family)?;
        let txn = self.store.begin(false)?;
        let meta = txn.cf(META_CF)?;
        let mut schema = Catalog
            .load(&txn, &meta, table)?
            .ok_or_else(|| DriverError::TableNotFound(table.to_string()))?;
        if schema.has_family(&family.name) {
            return Err(DriverError::InvalidArgument(format!(
                "family already exists: {table}/{}",
                family.name
            )));
        }
        schema.families.push(family);
        Catalog.save(&txn, &meta, &schema)?;
        txn.commit()?;
        self.invalidate(table);
        Ok(())
    }

    /// Remove a family descriptor and purge its cells.
    pub fn remove_family(&self, table: &str, family: &str) -> Result<(), DriverError> {
        let txn = self.store.begin(false)?;
        let meta = txn.cf(META_CF)?;
        let mut schema = Catalog
            .load(&txn, &meta, table)?
            .ok_or_else(|| DriverError::TableNotFound(table.to_string()))?;
        let Some(pos) = schema.families.iter().position(|f| f.name == family) else {
            return Err(DriverError::FamilyNotFound {
                table: table.to_string(),
                family: family.to_string(),
            });
        };
        schema.families.remove(pos);
        Catalog.save(&txn, &meta, &schema)?;

        let cf = txn.cf(table)?;
        let mut doomed = Vec::new();
        for result in txn.scan_prefix(&cf, b"")? {
            let (key, _) = result?;
            if encoding::parse_cell_key(&key).is_some_and(|c| c.family == family) {
                doomed.push(key);
            }
        }
        for key in &doomed {
            txn.delete(&cf, key)?;
        }
        txn.commit()?;
        self.invalidate(table);
        Ok(())
    }

    /// Replace a family's descriptor under its immutable name. The new
    /// version cap applies from the next write on.
    pub fn modify_family(&self, table: &str, family: FamilyDescriptor) -> Result<(), DriverError> {
        validate_family(&family)?;
        let txn = self.store.begin(false)?;
        let meta = txn.cf(META_CF)?;
        let mut schema = Catalog
            .load(&txn, &meta, table)?
            .ok_or_else(|| DriverError::TableNotFound(table.to_string()))?;
        let Some(slot) = schema.family_mut(&family.name) else {
            return Err(DriverError::FamilyNotFound {
                table: table.to_string(),
                family: family.name,
            });
        };
        *slot = family;
        Catalog.save(&txn, &meta, &schema)?;
        txn.commit()?;
        self.invalidate(table);
        Ok(())
    }

    pub fn list_tables(&self) -> Result<Vec<String>, DriverError> {
        let txn = self.store.begin(true)?;
        let meta = txn.cf(META_CF)?;
        let tables = Catalog.list(&txn, &meta)?;
        let _ = txn.rollback();
        Ok(tables)
    }

    /// Drop every cached table handle. Called after the backend connection
    /// is re-established; handles are re-resolved lazily.
    pub fn invalidate_handles(&self) {
        self.handles.write().unwrap().clear();
    }

    // ── Internals ───────────────────────────────────────────────

    fn schema(&self, table: &str) -> Result<Arc<TableSchema>, DriverError> {
        if let Some(schema) = self.handles.read().unwrap().get(table) {
            return Ok(Arc::clone(schema));
        }
        let txn = self.store.begin(true)?;
        let meta = txn.cf(META_CF)?;
        let schema = Catalog
            .load(&txn, &meta, table)?
            .ok_or_else(|| DriverError::TableNotFound(table.to_string()))?;
        let _ = txn.rollback();
        let schema = Arc::new(schema);
        self.handles
            .write()
            .unwrap()
            .insert(table.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn invalidate(&self, table: &str) {
        self.handles.write().unwrap().remove(table);
    }

    fn require_family<'s>(
        &self,
        schema: &'s TableSchema,
        family: &str,
    ) -> Result<&'s FamilyDescriptor, DriverError> {
        schema
            .family(family)
            .ok_or_else(|| DriverError::FamilyNotFound {
                table: schema.name.clone(),
                family: family.to_string(),
            })
    }

    fn parse_addresses(
        &self,
        schema: &TableSchema,
        columns: &[String],
    ) -> Result<Vec<ColumnAddress>, DriverError> {
        columns
            .iter()
            .map(|column| {
                let addr = ColumnAddress::parse(column)?;
                self.require_family(schema, addr.family())?;
                Ok(addr)
            })
            .collect()
    }
}

fn visible(cell_ts: Timestamp, bound: Option<Timestamp>) -> bool {
    bound.is_none_or(|b| cell_ts <= b)
}

fn matches_filters(filters: &[ColumnAddress], family: &str, qualifier: &str) -> bool {
    if filters.is_empty() {
        return true;
    }
    filters.iter().any(|f| match f {
        ColumnAddress::Wildcard { family: f } => f == family,
        ColumnAddress::Qualified {
            family: f,
            qualifier: q,
        } => f == family && q == qualifier,
    })
}

fn validate_table_name(name: &str) -> Result<(), DriverError> {
    if name.is_empty() || name.starts_with('_') || name.contains('\0') {
        return Err(DriverError::InvalidArgument(format!(
            "invalid table name: {name:?}"
        )));
    }
    Ok(())
}

fn validate_family(family: &FamilyDescriptor) -> Result<(), DriverError> {
    if family.name.is_empty() || family.name.contains(':') || family.name.contains('\0') {
        return Err(DriverError::InvalidArgument(format!(
            "invalid family name: {:?}",
            family.name
        )));
    }
    if family.max_versions == 0 {
        return Err(DriverError::InvalidArgument(
            "max_versions must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_row_id(row_id: &str) -> Result<(), DriverError> {
    if row_id.is_empty() || row_id.contains('\0') {
        return Err(DriverError::InvalidArgument(format!(
            "invalid row id: {row_id:?}"
        )));
    }
    Ok(())
}
