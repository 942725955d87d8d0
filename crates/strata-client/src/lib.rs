mod adapter;
mod client;
mod pool;
mod scan;

pub use adapter::Adapter;
pub use client::{Client, ClientError, ConnectConfig};
pub use pool::{AdapterPool, PooledAdapter};
pub use scan::{Batches, FullScan};
