use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per truck id. Anything that changes which driver holds a
/// truck, or the truck's status, runs while holding that truck's guard.
///
/// A slot lives only while some caller holds or waits on it, so ids that are
/// never seen again (including unknown ids from requests) do not accumulate.
#[derive(Debug, Default)]
pub struct TruckLocks {
    slots: DashMap<i64, Arc<Mutex<()>>>,
}

/// Held lock on one truck. Dropping it releases the truck and frees the slot
/// when nobody else is queued on it.
#[derive(Debug)]
pub struct TruckGuard<'a> {
    locks: &'a TruckLocks,
    truck_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TruckLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, truck_id: i64) -> TruckGuard<'_> {
        let guard = self.slot(truck_id).lock_owned().await;
        TruckGuard {
            locks: self,
            truck_id,
            guard: Some(guard),
        }
    }

    /// Locks several trucks in ascending id order, so two callers with
    /// overlapping sets cannot deadlock.
    pub async fn lock_all<I>(&self, truck_ids: I) -> Vec<TruckGuard<'_>>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut ids: Vec<i64> = truck_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.lock(id).await);
        }
        guards
    }

    pub fn tracked(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, truck_id: i64) -> Arc<Mutex<()>> {
        self.slots
            .entry(truck_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // The map's own reference is the only one left once every holder and
    // waiter is gone. Cloning happens under the shard lock, so this check
    // cannot race a new `slot` call.
    fn release_slot(&self, truck_id: i64) {
        self.slots
            .remove_if(&truck_id, |_, slot| Arc::strong_count(slot) == 1);
    }
}

impl TruckGuard<'_> {
    pub fn truck_id(&self) -> i64 {
        self.truck_id
    }
}

impl Drop for TruckGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release_slot(self.truck_id);
    }
}
