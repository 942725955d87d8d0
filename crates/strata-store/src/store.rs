use crate::error::StoreError;

pub type ScanIter<'a> = Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>), StoreError>> + 'a>;

/// A sorted key/value engine with named column families.
///
/// This is the seam where a backend client plugs into the companion process:
/// one implementation per backend, all driven through snapshot transactions.
pub trait Store {
    type Txn<'a>: Transaction
    where
        Self: 'a;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError>;
    fn create_cf(&self, name: &str) -> Result<(), StoreError>;
    fn drop_cf(&self, name: &str) -> Result<(), StoreError>;
}

pub trait Transaction {
    /// Backend-specific column family handle.
    /// Must be cheaply cloneable (backends use Arc-based or name handles).
    type Cf: Clone;

    /// Resolve a column family by name. Must be called before any reads on
    /// that CF.
    fn cf(&self, name: &str) -> Result<Self::Cf, StoreError>;

    // Reads
    fn get(&self, cf: &Self::Cf, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn scan_prefix<'a>(&'a self, cf: &Self::Cf, prefix: &[u8]) -> Result<ScanIter<'a>, StoreError>;
    /// Forward scan over `[start, end)`; either bound may be open.
    fn scan_range<'a>(
        &'a self,
        cf: &Self::Cf,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<ScanIter<'a>, StoreError>;

    // Writes
    fn put(&self, cf: &Self::Cf, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn put_batch(&self, cf: &Self::Cf, entries: &[(&[u8], &[u8])]) -> Result<(), StoreError>;
    fn delete(&self, cf: &Self::Cf, key: &[u8]) -> Result<(), StoreError>;

    // Schema
    fn create_cf(&mut self, name: &str) -> Result<(), StoreError>;
    fn drop_cf(&mut self, name: &str) -> Result<(), StoreError>;

    // Lifecycle
    fn commit(self) -> Result<(), StoreError>;
    fn rollback(self) -> Result<(), StoreError>;
}
