use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use session_energy::RoomReport;

use crate::snapshot::StoreSnapshot;

/// Last good report per room plus the latest snapshot.
///
/// A report is replaced whole on each successful resolution and left in
/// place when a later snapshot has no data for the room, so readers never
/// see a half-updated entry or a transient gap.
#[derive(Default)]
pub struct RoomCache {
    reports: RwLock<HashMap<String, Arc<RoomReport>>>,
    snapshot: RwLock<Option<Arc<StoreSnapshot>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RoomCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, report: RoomReport) {
        let room = report.resolution.room.clone();
        write(&self.reports).insert(room, Arc::new(report));
    }

    pub fn get(&self, room: &str) -> Option<Arc<RoomReport>> {
        read(&self.reports).get(room).cloned()
    }

    /// Cached reports ordered by room name.
    pub fn all(&self) -> Vec<Arc<RoomReport>> {
        let mut reports: Vec<Arc<RoomReport>> = read(&self.reports).values().cloned().collect();
        reports.sort_by(|a, b| a.resolution.room.cmp(&b.resolution.room));
        reports
    }

    pub fn set_snapshot(&self, snapshot: Arc<StoreSnapshot>) {
        *write(&self.snapshot) = Some(snapshot);
    }

    pub fn latest_snapshot(&self) -> Option<Arc<StoreSnapshot>> {
        read(&self.snapshot).clone()
    }
}
