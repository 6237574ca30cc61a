use crate::capabilities::{GeolocationResult, KvResult, SearchHttpResult, StorageKey};
use crate::config::CoreConfig;
use crate::map_view::MoveOrigin;

#[derive(Debug)]
pub enum Event {
    Startup,
    Configure {
        config: CoreConfig,
    },

    // --- Persistence callbacks ---
    RegionsLoaded(KvResult),
    ActiveRegionLoaded(KvResult),
    RegionsPersisted {
        key: StorageKey,
        result: KvResult,
    },

    // --- Search ---
    SearchQueryChanged {
        query: String,
    },
    SearchDebounceElapsed {
        generation: u64,
    },
    SearchResponse {
        generation: u64,
        result: Box<SearchHttpResult>,
    },
    SearchResultPicked {
        index: usize,
        persist: bool,
        picked_at_ms: u64,
    },
    /// The location picker went away. Late search and geolocation answers
    /// are dropped from here on.
    SearchClosed,

    // --- Geolocation ---
    UseCurrentLocation {
        persist: bool,
    },
    GeolocationResolved {
        request_id: u64,
        persist: bool,
        result: GeolocationResult,
    },

    // --- Saved regions ---
    SelectRegion {
        id: String,
    },
    RemoveRegion {
        id: String,
    },
    PersistTemporary,
    ClearTemporary,

    // --- Map ---
    MapMounted,
    MapMoved {
        lat: f64,
        lng: f64,
        zoom: Option<f64>,
        origin: MoveOrigin,
    },
    MapRecenter,
    MapUnmounted,

    DismissMessage,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Startup => "startup",
            Event::Configure { .. } => "configure",
            Event::RegionsLoaded(_) => "regions_loaded",
            Event::ActiveRegionLoaded(_) => "active_region_loaded",
            Event::RegionsPersisted { .. } => "regions_persisted",
            Event::SearchQueryChanged { .. } => "search_query_changed",
            Event::SearchDebounceElapsed { .. } => "search_debounce_elapsed",
            Event::SearchResponse { .. } => "search_response",
            Event::SearchResultPicked { .. } => "search_result_picked",
            Event::SearchClosed => "search_closed",
            Event::UseCurrentLocation { .. } => "use_current_location",
            Event::GeolocationResolved { .. } => "geolocation_resolved",
            Event::SelectRegion { .. } => "select_region",
            Event::RemoveRegion { .. } => "remove_region",
            Event::PersistTemporary => "persist_temporary",
            Event::ClearTemporary => "clear_temporary",
            Event::MapMounted => "map_mounted",
            Event::MapMoved { .. } => "map_moved",
            Event::MapRecenter => "map_recenter",
            Event::MapUnmounted => "map_unmounted",
            Event::DismissMessage => "dismiss_message",
        }
    }

    /// Events that come straight from a user action rather than a callback.
    pub fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Event::SearchQueryChanged { .. }
                | Event::SearchResultPicked { .. }
                | Event::SearchClosed
                | Event::UseCurrentLocation { .. }
                | Event::SelectRegion { .. }
                | Event::RemoveRegion { .. }
                | Event::PersistTemporary
                | Event::ClearTemporary
                | Event::MapMoved {
                    origin: MoveOrigin::User,
                    ..
                }
                | Event::MapRecenter
                | Event::DismissMessage
        )
    }
}
