use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use rocksdb::{BoundColumnFamily, Direction, IteratorMode, Options};

use crate::error::StoreError;
use crate::store::{ScanIter, Transaction};

use super::store::Db;

/// Pre-resolved column family handle.
#[derive(Clone)]
pub struct RocksCf<'db> {
    handle: Arc<BoundColumnFamily<'db>>,
}

pub struct RocksTransaction<'db> {
    txn: Option<rocksdb::Transaction<'db, Db>>,
    db: &'db Db,
    read_only: bool,
    cf_cache: RefCell<HashMap<String, Arc<BoundColumnFamily<'db>>>>,
}

impl<'db> RocksTransaction<'db> {
    pub(crate) fn new(db: &'db Db, read_only: bool) -> Self {
        Self {
            txn: Some(db.transaction()),
            db,
            read_only,
            cf_cache: RefCell::new(HashMap::new()),
        }
    }

    fn txn(&self) -> Result<&rocksdb::Transaction<'db, Db>, StoreError> {
        self.txn.as_ref().ok_or(StoreError::TransactionConsumed)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    /// Resolve a CF handle, caching it for reuse.
    fn cf_handle(&self, cf: &str) -> Result<Arc<BoundColumnFamily<'db>>, StoreError> {
        if let Some(handle) = self.cf_cache.borrow().get(cf) {
            return Ok(Arc::clone(handle));
        }
        let handle = self
            .db
            .cf_handle(cf)
            .ok_or_else(|| StoreError::UnknownColumnFamily(cf.to_string()))?;
        self.cf_cache
            .borrow_mut()
            .insert(cf.to_string(), Arc::clone(&handle));
        Ok(handle)
    }
}

impl<'db> Transaction for RocksTransaction<'db> {
    type Cf = RocksCf<'db>;

    fn cf(&self, name: &str) -> Result<Self::Cf, StoreError> {
        let handle = self.cf_handle(name)?;
        Ok(RocksCf { handle })
    }

    fn get(&self, cf: &Self::Cf, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.txn()?
            .get_cf(&cf.handle, key)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn scan_prefix<'a>(&'a self, cf: &Self::Cf, prefix: &[u8]) -> Result<ScanIter<'a>, StoreError> {
        let prefix_owned = prefix.to_vec();
        let iter = self
            .txn()?
            .iterator_cf(&cf.handle, IteratorMode::From(prefix, Direction::Forward));
        Ok(Box::new(
            iter.take_while(move |item| match item {
                Ok((key, _)) => key.starts_with(&prefix_owned),
                Err(_) => true,
            })
            .map(|item| {
                item.map(|(k, v)| (k.into_vec(), v.into_vec()))
                    .map_err(|e| StoreError::Storage(e.to_string()))
            }),
        ))
    }

    fn scan_range<'a>(
        &'a self,
        cf: &Self::Cf,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<ScanIter<'a>, StoreError> {
        let mode = match start {
            Some(s) => IteratorMode::From(s, Direction::Forward),
            None => IteratorMode::Start,
        };
        let end_owned = end.map(|e| e.to_vec());
        let iter = self.txn()?.iterator_cf(&cf.handle, mode);
        Ok(Box::new(
            iter.take_while(move |item| match (item, &end_owned) {
                (Ok((key, _)), Some(end)) => key.as_ref() < end.as_slice(),
                _ => true,
            })
            .map(|item| {
                item.map(|(k, v)| (k.into_vec(), v.into_vec()))
                    .map_err(|e| StoreError::Storage(e.to_string()))
            }),
        ))
    }

    fn put(&self, cf: &Self::Cf, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.txn()?
            .put_cf(&cf.handle, key, value)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn put_batch(&self, cf: &Self::Cf, entries: &[(&[u8], &[u8])]) -> Result<(), StoreError> {
        self.check_writable()?;
        let txn = self.txn()?;
        for (key, value) in entries {
            txn.put_cf(&cf.handle, key, value)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    fn delete(&self, cf: &Self::Cf, key: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.txn()?
            .delete_cf(&cf.handle, key)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn create_cf(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.db.cf_handle(name).is_none() {
            let opts = Options::default();
            self.db
                .create_cf(name, &opts)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        // Pre-warm the cache for the newly created CF.
        if let Some(handle) = self.db.cf_handle(name) {
            self.cf_cache.borrow_mut().insert(name.to_string(), handle);
        }
        Ok(())
    }

    fn drop_cf(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.cf_cache.borrow_mut().remove(name);
        self.db
            .drop_cf(name)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let txn = self.txn.take().ok_or(StoreError::TransactionConsumed)?;
        txn.commit().map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn rollback(mut self) -> Result<(), StoreError> {
        let txn = self.txn.take().ok_or(StoreError::TransactionConsumed)?;
        txn.rollback()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}
