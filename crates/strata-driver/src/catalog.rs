//! Table metadata storage.
//!
//! Schemas live in a reserved `_meta` column family, keyed by table name and
//! serialized with msgpack. User table names may not start with `_`, so the
//! reserved CF can never collide with a data CF.

use strata_model::TableSchema;
use strata_store::Transaction;

use crate::error::DriverError;

pub(crate) const META_CF: &str = "_meta";

pub(crate) struct Catalog;

impl Catalog {
    pub(crate) fn load<T: Transaction>(
        &self,
        txn: &T,
        meta: &T::Cf,
        table: &str,
    ) -> Result<Option<TableSchema>, DriverError> {
        match txn.get(meta, table.as_bytes())? {
            Some(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn save<T: Transaction>(
        &self,
        txn: &T,
        meta: &T::Cf,
        schema: &TableSchema,
    ) -> Result<(), DriverError> {
        let bytes = rmp_serde::to_vec(schema)?;
        txn.put(meta, schema.name.as_bytes(), &bytes)?;
        Ok(())
    }

    pub(crate) fn remove<T: Transaction>(
        &self,
        txn: &T,
        meta: &T::Cf,
        table: &str,
    ) -> Result<(), DriverError> {
        txn.delete(meta, table.as_bytes())?;
        Ok(())
    }

    pub(crate) fn list<T: Transaction>(
        &self,
        txn: &T,
        meta: &T::Cf,
    ) -> Result<Vec<String>, DriverError> {
        let mut tables = Vec::new();
        for result in txn.scan_prefix(meta, b"")? {
            let (key, _) = result?;
            if let Ok(name) = std::str::from_utf8(&key) {
                tables.push(name.to_string());
            }
        }
        Ok(tables)
    }
}
