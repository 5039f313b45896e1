//! Per-member mutual exclusion for ledger mutations.

use std::sync::Arc;

use amarra_shared::types::MemberId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// At most one in-flight mutation per member; different members never wait
/// on each other.
#[derive(Debug, Default)]
pub struct MemberLocks {
    locks: DashMap<MemberId, Arc<Mutex<()>>>,
}

impl MemberLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `member_id`'s ledger.
    ///
    /// Entries nobody holds or waits on are dropped first.
    pub async fn lock(&self, member_id: MemberId) -> OwnedMutexGuard<()> {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        let mutex = Arc::clone(self.locks.entry(member_id).or_default().value());
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}
