use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::error::{AppError, UserFacingError};
use crate::location::{GeolocationTracker, PlaceCandidate, SearchCache, SearchDebouncer};
use crate::map_view::{FollowMode, MapViewController};
use crate::region::{Coordinate, Region, RegionId};
use crate::region_store::{PersistedRegions, RegionStore};

#[derive(Debug, Default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<PlaceCandidate>,
    pub debouncer: SearchDebouncer,
    pub cache: SearchCache,
}

impl SearchState {
    pub fn is_searching(&self) -> bool {
        self.debouncer.pending_generation().is_some() || self.debouncer.in_flight()
    }

    /// Clears the box. Returns the pending timer to cancel, if any.
    pub fn reset(&mut self) -> Option<u64> {
        self.query.clear();
        self.results.clear();
        self.debouncer.cancel()
    }
}

/// Values read from storage while startup is in progress. Both keys must be
/// answered before the store hydrates.
#[derive(Debug, Default)]
pub struct PendingLoad {
    pub regions: Option<Vec<Region>>,
    pub active_id: Option<Option<RegionId>>,
}

impl PendingLoad {
    pub fn take_complete(&mut self) -> Option<PersistedRegions> {
        if self.regions.is_none() || self.active_id.is_none() {
            return None;
        }
        Some(PersistedRegions {
            regions: self.regions.take().unwrap_or_default(),
            active_id: self.active_id.take().flatten(),
        })
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: CoreConfig,
    pub started: bool,
    pub pending_load: PendingLoad,
    pub regions: RegionStore,
    pub search: SearchState,
    pub geolocation: GeolocationTracker,
    pub map: Option<MapViewController>,
    pub active_error: Option<AppError>,
    pub notice: Option<String>,
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn current_coordinate(&self) -> Option<Coordinate> {
        self.regions
            .current_selection()
            .and_then(|region| region.coordinate().ok())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SelectionView {
    pub region: Region,
    pub is_temporary: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedRegionView {
    pub id: String,
    pub name: String,
    pub label: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchResultView {
    pub index: usize,
    pub name: String,
    pub label: String,
    pub kind: Option<String>,
    pub population: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<SearchResultView>,
    pub is_searching: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewportView {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
    pub follow_mode: FollowMode,
    /// Apply `lat`/`lng`/`zoom` programmatically whenever this changes.
    pub revision: u64,
}

/// What downstream air-quality, forecast and map-data fetchers key off.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: u32,
    pub result_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub ready: bool,
    pub selection: Option<SelectionView>,
    pub saved_regions: Vec<SavedRegionView>,
    pub search: SearchView,
    pub is_locating: bool,
    pub viewport: Option<ViewportView>,
    pub data_query: Option<DataQuery>,
    pub error: Option<UserFacingError>,
    pub notice: Option<String>,
}
