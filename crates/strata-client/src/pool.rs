use std::ops::{Deref, DerefMut};

use crossbeam::channel::{Receiver, Sender};

use crate::adapter::Adapter;
use crate::client::{ClientError, ConnectConfig};

/// A fixed-size pool of adapters for caller-side fan-out. The driver is
/// single-call-at-a-time per connection, so parallel callers each take
/// their own adapter.
pub struct AdapterPool {
    sender: Sender<Adapter>,
    receiver: Receiver<Adapter>,
}

impl AdapterPool {
    pub fn new(addr: &str, config: ConnectConfig, size: usize) -> Result<Self, ClientError> {
        let (sender, receiver) = crossbeam::channel::bounded(size);
        for _ in 0..size {
            let adapter = Adapter::connect(addr, config.clone())?;
            sender
                .send(adapter)
                .map_err(|e| ClientError::Io(std::io::Error::other(e.to_string())))?;
        }
        Ok(Self { sender, receiver })
    }

    /// Take an adapter, blocking until one is free. It returns to the pool
    /// on drop.
    pub fn get(&self) -> Result<PooledAdapter<'_>, ClientError> {
        let adapter = self
            .receiver
            .recv()
            .map_err(|e| ClientError::Io(std::io::Error::other(e.to_string())))?;
        Ok(PooledAdapter {
            adapter: Some(adapter),
            pool: &self.sender,
        })
    }
}

pub struct PooledAdapter<'a> {
    adapter: Option<Adapter>,
    pool: &'a Sender<Adapter>,
}

impl Deref for PooledAdapter<'_> {
    type Target = Adapter;

    fn deref(&self) -> &Adapter {
        // BUG: adapter is always Some until Drop runs, and Deref cannot be called after Drop
        self.adapter.as_ref().expect("BUG: adapter already consumed")
    }
}

impl DerefMut for PooledAdapter<'_> {
    fn deref_mut(&mut self) -> &mut Adapter {
        // BUG: adapter is always Some until Drop runs, and DerefMut cannot be called after Drop
        self.adapter.as_mut().expect("BUG: adapter already consumed")
    }
}

impl Drop for PooledAdapter<'_> {
    fn drop(&mut self) {
        if let Some(adapter) = self.adapter.take() {
            let _ = self.pool.send(adapter);
        }
    }
}
