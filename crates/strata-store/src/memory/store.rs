use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use arc_swap::ArcSwap;
use imbl::OrdMap;

use crate::error::StoreError;
use crate::store::Store;

use super::transaction::MemoryTransaction;

pub(crate) type CfData = OrdMap<Vec<u8>, Vec<u8>>;

/// In-memory backend: one persistent ordered map per column family behind an
/// `ArcSwap`, so read transactions snapshot for free via structural sharing.
/// Writers are serialized by a store-wide mutex and publish whole column
/// families on commit.
pub struct MemoryStore {
    cfs: RwLock<HashMap<String, Arc<ArcSwap<CfData>>>>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            cfs: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot one column family. Cheap due to structural sharing.
    pub(crate) fn snapshot_cf(&self, name: &str) -> Option<Arc<CfData>> {
        let cfs = self.cfs.read().unwrap();
        cfs.get(name).map(|slot| slot.load_full())
    }

    /// Publish committed column families. Only called while the write lock
    /// is held, so publishes never interleave.
    pub(crate) fn publish(&self, dirty: HashMap<String, Arc<CfData>>) {
        let cfs = self.cfs.read().unwrap();
        for (name, data) in dirty {
            if let Some(slot) = cfs.get(&name) {
                slot.store(data);
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    type Txn<'a> = MemoryTransaction<'a>;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError> {
        if read_only {
            return Ok(MemoryTransaction::new_read_only(self));
        }
        let guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Storage(format!("write lock poisoned: {e}")))?;
        Ok(MemoryTransaction::new_writable(self, guard))
    }

    fn create_cf(&self, name: &str) -> Result<(), StoreError> {
        let mut cfs = self.cfs.write().unwrap();
        cfs.entry(name.to_string())
            .or_insert_with(|| Arc::new(ArcSwap::new(Arc::new(CfData::new()))));
        Ok(())
    }

    fn drop_cf(&self, name: &str) -> Result<(), StoreError> {
        let mut cfs = self.cfs.write().unwrap();
        cfs.remove(name);
        Ok(())
    }
}
