use std::path::Path;

use rocksdb::{MultiThreaded, OptimisticTransactionDB, Options};

use crate::error::StoreError;
use crate::store::Store;

use super::transaction::RocksTransaction;

pub(crate) type Db = OptimisticTransactionDB<MultiThreaded>;

pub struct RocksStore {
    db: Db,
}

impl RocksStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        // Column families must be listed up front when reopening.
        let existing = Db::list_cf(&opts, path).unwrap_or_default();
        let db = if existing.is_empty() {
            Db::open(&opts, path)
        } else {
            Db::open_cf(&opts, path, existing)
        }
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(Self { db })
    }
}

impl Store for RocksStore {
    type Txn<'a> = RocksTransaction<'a>;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError> {
        Ok(RocksTransaction::new(&self.db, read_only))
    }

    fn create_cf(&self, name: &str) -> Result<(), StoreError> {
        if self.db.cf_handle(name).is_none() {
            let opts = Options::default();
            self.db
                .create_cf(name, &opts)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    fn drop_cf(&self, name: &str) -> Result<(), StoreError> {
        self.db
            .drop_cf(name)
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}
