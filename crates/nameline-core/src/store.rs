// # Record Store
//
// In-memory hostname -> address map shared by the resolver loop and any
// co-located registration surface.
//
// ## Crash Behavior
//
// - All records are lost on restart/crash
// - Services re-register on startup, so a fresh store converges quickly
// - No recovery possible (records are in-memory only)

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared record store
///
/// A cheap-to-clone handle over a HashMap protected by a RwLock. Every
/// clone reads and writes the same map, so the resolver loop and an HTTP
/// registration handler can share one store without extra plumbing.
///
/// Addresses are stored as opaque strings; the registry never validates
/// or interprets them.
#[derive(Debug, Clone)]
pub struct RecordStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl RecordStore {
    /// Create a new empty record store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert or overwrite the record for `hostname`.
    ///
    /// Returns the previously registered address, if any.
    pub async fn put(&self, hostname: &str, address: &str) -> Option<String> {
        let mut guard = self.inner.write().await;
        guard.insert(hostname.to_string(), address.to_string())
    }

    /// Look up the address registered for `hostname`.
    pub async fn get(&self, hostname: &str) -> Option<String> {
        let guard = self.inner.read().await;
        guard.get(hostname).cloned()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Clear all records from the store
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.clear();
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
