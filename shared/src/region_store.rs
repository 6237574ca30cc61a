//! Saved regions, the active-region pointer and the transient selection.
//!
//! All operations are synchronous and complete before returning. Persistence is
//! write-through from the app layer: it compares [`RegionStore::revision`] before
//! and after an event and writes [`RegionStore::snapshot`] when it moved.
//!
//! After every mutation the store "settles": once initialized, a store with no
//! temporary selection, no active id and no saved regions seeds the built-in
//! default region and activates it, so [`RegionStore::current_selection`] is
//! never `None` after [`RegionStore::hydrate`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::region::{Region, RegionId};

pub const MAX_SAVED_REGIONS: usize = 6;

/// What the dashboard is currently focused on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection<'a> {
    /// Held in memory only; wins over any persisted active id.
    Temporary(&'a Region),
    Persisted(&'a Region),
}

impl<'a> Selection<'a> {
    pub fn region(self) -> &'a Region {
        match self {
            Selection::Temporary(region) | Selection::Persisted(region) => region,
        }
    }

    pub fn is_temporary(self) -> bool {
        matches!(self, Selection::Temporary(_))
    }
}

/// The record written to the `regions` and `regions:active` keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedRegions {
    pub regions: Vec<Region>,
    pub active_id: Option<RegionId>,
}

#[derive(Debug, Clone, Default)]
pub struct RegionStore {
    saved: Vec<Region>,
    active_id: Option<RegionId>,
    temporary: Option<Region>,
    initialized: bool,
    revision: u64,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already hydrated from `persisted`.
    pub fn hydrated(persisted: PersistedRegions) -> Self {
        let mut store = Self::new();
        store.hydrate(persisted);
        store
    }

    pub fn saved(&self) -> &[Region] {
        &self.saved
    }

    pub fn active_id(&self) -> Option<&RegionId> {
        self.active_id.as_ref()
    }

    pub fn temporary(&self) -> Option<&Region> {
        self.temporary.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.saved.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.get(id).is_some()
    }

    pub fn selection(&self) -> Option<Selection<'_>> {
        if let Some(temporary) = &self.temporary {
            return Some(Selection::Temporary(temporary));
        }
        self.active_id
            .as_ref()
            .and_then(|id| self.get(id))
            .map(Selection::Persisted)
    }

    pub fn current_selection(&self) -> Option<&Region> {
        self.selection().map(Selection::region)
    }

    pub fn snapshot(&self) -> PersistedRegions {
        PersistedRegions {
            regions: self.saved.clone(),
            active_id: self.active_id.clone(),
        }
    }

    /// Applies what was read from storage. Runs once; later calls are ignored.
    ///
    /// Records are cleaned on the way in: invalid coordinates and duplicate ids
    /// are dropped, the list is capped, and a dangling or missing active id
    /// falls back to the most recent saved region. Regions this session saved
    /// before the read finished stay in front, with the stored ones merged
    /// behind them.
    pub fn hydrate(&mut self, persisted: PersistedRegions) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let session_changed = self.revision > 0;
        let session_saved = self.saved.len();
        let loaded = persisted.regions.len();
        let mut seen: HashSet<RegionId> = self.saved.iter().map(|r| r.id.clone()).collect();
        let stored: Vec<Region> = persisted
            .regions
            .into_iter()
            .filter(|region| region.is_valid() && seen.insert(region.id.clone()))
            .collect();
        if stored.len() != loaded {
            warn!(
                loaded,
                kept = stored.len(),
                "dropped invalid or duplicate stored regions"
            );
        }
        self.saved.extend(stored);
        self.saved.truncate(MAX_SAVED_REGIONS);

        if self.temporary.is_none() && self.active_id.is_none() {
            self.active_id = match persisted.active_id {
                Some(id) if self.contains(&id) => Some(id),
                _ => self.saved.first().map(|r| r.id.clone()),
            };
        }

        if session_changed {
            info!(
                session_saved,
                saved = self.saved.len(),
                "merged stored regions behind this session's changes"
            );
            self.touch();
        }
        debug!(
            saved = self.saved.len(),
            active = ?self.active_id,
            "region store hydrated"
        );
        self.settle();
    }

    /// Moves `region` to the front of the saved list, replacing any entry with
    /// the same id, and drops whatever falls past the cap.
    pub fn upsert(&mut self, region: Region) {
        self.insert_front(region);
        self.touch();
        self.settle();
    }

    /// `persist = true` saves the region and makes it active. `persist = false`
    /// holds it as the temporary selection and clears the active id.
    pub fn activate(&mut self, region: Region, persist: bool) {
        if persist {
            self.temporary = None;
            self.active_id = Some(region.id.clone());
            self.insert_front(region);
        } else {
            self.active_id = None;
            self.temporary = Some(region);
        }
        self.touch();
        self.settle();
    }

    /// Unknown ids are ignored; returns whether the selection changed.
    pub fn select_existing(&mut self, id: &RegionId) -> bool {
        if !self.contains(id) {
            debug!(region_id = %id, "select ignored, region not saved");
            return false;
        }
        self.temporary = None;
        self.active_id = Some(id.clone());
        self.touch();
        self.settle();
        true
    }

    /// Unknown ids are ignored; returns whether anything was removed.
    pub fn remove(&mut self, id: &RegionId) -> bool {
        let before = self.saved.len();
        self.saved.retain(|r| &r.id != id);
        let removed_saved = self.saved.len() != before;

        let removed_temporary = self.temporary.as_ref().is_some_and(|t| &t.id == id);
        if removed_temporary {
            self.temporary = None;
        }

        if !removed_saved && !removed_temporary {
            debug!(region_id = %id, "remove ignored, region unknown");
            return false;
        }

        let was_active = self.active_id.as_ref() == Some(id);
        if was_active || (removed_temporary && self.active_id.is_none()) {
            self.active_id = self.saved.first().map(|r| r.id.clone());
        }

        self.touch();
        self.settle();
        true
    }

    /// Saves the temporary selection and makes it active. Returns whether
    /// there was one.
    pub fn persist_temporary(&mut self) -> bool {
        match self.temporary.take() {
            Some(region) => {
                self.activate(region, true);
                true
            }
            None => false,
        }
    }

    /// Drops the temporary selection, falling back to the most recent saved
    /// region when nothing is active.
    pub fn clear_temporary(&mut self) {
        let had_temporary = self.temporary.take().is_some();
        let fallback = self.active_id.is_none() && !self.saved.is_empty();
        if fallback {
            self.active_id = self.saved.first().map(|r| r.id.clone());
        }
        if had_temporary || fallback {
            self.touch();
        }
        self.settle();
    }

    fn insert_front(&mut self, region: Region) {
        self.saved.retain(|r| r.id != region.id);
        self.saved.insert(0, region);
        if self.saved.len() > MAX_SAVED_REGIONS {
            for evicted in self.saved.drain(MAX_SAVED_REGIONS..) {
                debug!(region_id = %evicted.id, "evicted least recent region");
            }
        }
        if let Some(active) = &self.active_id {
            if !self.saved.iter().any(|r| &r.id == active) {
                self.active_id = self.saved.first().map(|r| r.id.clone());
            }
        }
    }

    fn settle(&mut self) {
        if !self.initialized
            || self.temporary.is_some()
            || self.active_id.is_some()
            || !self.saved.is_empty()
        {
            return;
        }
        let default = Region::builtin_default();
        info!(region_id = %default.id, "no regions left, seeding default");
        self.active_id = Some(default.id.clone());
        self.saved.push(default);
        self.touch();
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
