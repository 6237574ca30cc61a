use tracing::{debug, info, warn};

use crate::capabilities::{
    encode, read_value, search_body, Capabilities, KvResult, StorageError, StorageKey,
};
use crate::error::{AppError, UserFacingError};
use crate::event::Event;
use crate::location::{parse_search_body, DebounceAction};
use crate::map_view::MapViewController;
use crate::model::{
    DataQuery, Model, SavedRegionView, SearchResultView, SearchView, SelectionView, ViewModel,
    ViewportView,
};
use crate::region::{Coordinate, Region, RegionId};

#[derive(Default)]
pub struct App;

impl App {
    fn load_regions(caps: &Capabilities) {
        caps.key_value
            .get(StorageKey::Regions.raw().to_string(), Event::RegionsLoaded);
        caps.key_value.get(
            StorageKey::ActiveRegion.raw().to_string(),
            Event::ActiveRegionLoaded,
        );
    }

    fn try_hydrate(model: &mut Model) {
        if let Some(persisted) = model.pending_load.take_complete() {
            info!(
                saved = persisted.regions.len(),
                active = persisted.active_id.as_ref().map(RegionId::as_str),
                "hydrating region store"
            );
            model.regions.hydrate(persisted);
        }
    }

    /// Writes both keys. A failed write is surfaced but memory stays authoritative.
    fn persist_regions(model: &mut Model, caps: &Capabilities) {
        let snapshot = model.regions.snapshot();

        let writes = [
            (StorageKey::Regions, encode(StorageKey::Regions, &snapshot.regions)),
            (
                StorageKey::ActiveRegion,
                encode(StorageKey::ActiveRegion, &snapshot.active_id),
            ),
        ];
        for (key, bytes) in writes {
            match bytes {
                Ok(bytes) => caps.key_value.set(
                    key.raw().to_string(),
                    bytes,
                    move |result| Event::RegionsPersisted { key, result },
                ),
                Err(e) => {
                    warn!(key = %key, error = %e, "could not encode regions");
                    model.set_error(e.into());
                }
            }
        }
    }

    fn cancel_search(model: &mut Model, caps: &Capabilities) {
        if let Some(timer) = model.search.reset() {
            caps.timer.cancel(timer);
        }
    }

    fn query_changed(query: String, model: &mut Model, caps: &Capabilities) {
        let action = model.search.debouncer.input(
            &query,
            model.config.min_search_chars(),
            model.config.search_debounce_ms,
        );
        model.search.query = query;

        match action {
            DebounceAction::Schedule {
                generation,
                delay_ms,
                replaces,
            } => {
                if let Some(old) = replaces {
                    caps.timer.cancel(old);
                }
                caps.timer.start(generation, delay_ms, move || {
                    Event::SearchDebounceElapsed { generation }
                });
            }
            DebounceAction::Cleared { cancelled } => {
                if let Some(old) = cancelled {
                    caps.timer.cancel(old);
                }
                model.search.results.clear();
            }
        }
    }

    fn issue_search(generation: u64, model: &mut Model, caps: &Capabilities) {
        let Some(query) = model.search.debouncer.fire(generation) else {
            return;
        };

        if let Some(cached) = model.search.cache.get(&query) {
            debug!(query = %query, results = cached.len(), "search served from cache");
            model.search.debouncer.accept(generation);
            model.search.results = cached;
            return;
        }

        let endpoint = match model.config.search_endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!(error = %e, "search endpoint unusable");
                model.search.debouncer.accept(generation);
                model.set_error(e.into());
                return;
            }
        };
        let url = endpoint.search_url(&query, model.config.search_limit);
        debug!(generation, query = %query, "issuing search");

        caps.http
            .get(url.as_str())
            .send(move |result| Event::SearchResponse {
                generation,
                result: Box::new(result),
            });
    }

    fn search_answered(
        generation: u64,
        result: crate::capabilities::SearchHttpResult,
        model: &mut Model,
    ) {
        let Some(query) = model.search.debouncer.accept(generation) else {
            return;
        };

        match search_body(result) {
            Ok(body) => {
                let candidates = parse_search_body(&body);
                debug!(query = %query, results = candidates.len(), "search answered");
                model.search.cache.insert(&query, candidates.clone());
                model.search.results = candidates;
            }
            Err(e) => {
                warn!(query = %query, error = %e, "search failed");
                model.search.results.clear();
                model.set_error(e.into());
            }
        }
    }

    fn storage_loaded<T>(key: StorageKey, result: &KvResult, model: &mut Model) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        match read_value::<T>(key, result) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "stored regions unreadable, starting empty");
                model.set_error(e.into());
                None
            }
        }
    }

    fn sync_viewport(model: &mut Model) {
        let target = model.current_coordinate();
        if let (Some(map), Some(target)) = (model.map.as_mut(), target) {
            if let Some(command) = map.selection_changed(target) {
                debug!(
                    lat = command.center.lat(),
                    lon = command.center.lon(),
                    revision = command.revision,
                    "viewport follows selection"
                );
            }
        }
    }

    fn region_view(model: &Model) -> Vec<SavedRegionView> {
        let active = model.regions.active_id();
        model
            .regions
            .saved()
            .iter()
            .map(|region| SavedRegionView {
                id: region.id.to_string(),
                name: region.name.clone(),
                label: region.label.clone(),
                is_active: model.regions.temporary().is_none() && active == Some(&region.id),
            })
            .collect()
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            debug!(event = event_name, "user action");
        } else {
            debug!(event = event_name, "update");
        }
        let revision = model.regions.revision();

        match event {
            Event::Startup => {
                if model.started {
                    debug!("startup repeated, ignored");
                } else {
                    model.started = true;
                    Self::load_regions(caps);
                }
            }

            Event::Configure { config } => match config.validate() {
                Ok(()) => {
                    info!(base_url = %config.search_base_url, "core configured");
                    model.config = config;
                }
                Err(e) => {
                    warn!(error = %e, "configuration rejected, keeping previous");
                    model.set_error(e.into());
                }
            },

            Event::RegionsLoaded(result) => {
                let regions =
                    Self::storage_loaded::<Vec<Region>>(StorageKey::Regions, &result, model);
                model.pending_load.regions = Some(regions.unwrap_or_default());
                Self::try_hydrate(model);
            }

            Event::ActiveRegionLoaded(result) => {
                let active = Self::storage_loaded::<Option<RegionId>>(
                    StorageKey::ActiveRegion,
                    &result,
                    model,
                );
                model.pending_load.active_id = Some(active.flatten());
                Self::try_hydrate(model);
            }

            Event::RegionsPersisted { key, result } => match result {
                Ok(_) => debug!(key = %key, "regions persisted"),
                Err(e) => {
                    warn!(key = %key, error = %e, "persisting regions failed");
                    model.set_error(StorageError::write(key, &e).into());
                }
            },

            Event::SearchQueryChanged { query } => Self::query_changed(query, model, caps),

            Event::SearchDebounceElapsed { generation } => {
                Self::issue_search(generation, model, caps);
            }

            Event::SearchResponse { generation, result } => {
                Self::search_answered(generation, *result, model);
            }

            Event::SearchResultPicked {
                index,
                persist,
                picked_at_ms,
            } => {
                let picked = model
                    .search
                    .results
                    .get(index)
                    .map(|candidate| candidate.to_region(picked_at_ms));
                match picked {
                    Some(Ok(region)) => {
                        info!(id = %region.id, persist, "search result picked");
                        model.regions.activate(region, persist);
                        Self::cancel_search(model, caps);
                    }
                    Some(Err(e)) => {
                        warn!(index, error = %e, "picked result has invalid coordinates");
                        model.set_error(e.into());
                    }
                    None => debug!(index, "pick out of range, ignored"),
                }
            }

            Event::SearchClosed => {
                Self::cancel_search(model, caps);
                model.geolocation.cancel();
            }

            Event::UseCurrentLocation { persist } => {
                let request_id = model.geolocation.begin();
                model.notice = None;
                caps.geolocation.current_position(
                    model.config.geolocation_timeout_ms,
                    move |result| Event::GeolocationResolved {
                        request_id,
                        persist,
                        result,
                    },
                );
            }

            Event::GeolocationResolved {
                request_id,
                persist,
                result,
            } => {
                if let Some(fix) = model.geolocation.complete(request_id, result) {
                    let region = match fix.fallback {
                        Some(reason) => {
                            info!(reason = %reason, "location unavailable, using default region");
                            model.notice = Some(AppError::from(reason).user_facing_message());
                            Region::builtin_default()
                        }
                        None => Region::from_position(fix.coordinate),
                    };
                    model.regions.activate(region, persist);
                }
            }

            Event::SelectRegion { id } => {
                if !model.regions.select_existing(&RegionId::new(id)) {
                    debug!("select of unknown region ignored");
                }
            }

            Event::RemoveRegion { id } => {
                if !model.regions.remove(&RegionId::new(id)) {
                    debug!("remove of unknown region ignored");
                }
            }

            Event::PersistTemporary => {
                if !model.regions.persist_temporary() {
                    debug!("no temporary selection to persist");
                }
            }

            Event::ClearTemporary => model.regions.clear_temporary(),

            Event::MapMounted => {
                model.map = Some(MapViewController::new(model.current_coordinate()));
            }

            Event::MapMoved {
                lat,
                lng,
                zoom,
                origin,
            } => {
                match (model.map.as_mut(), Coordinate::new(lat, lng)) {
                    (Some(map), Ok(center)) => map.viewport_moved(center, zoom, origin),
                    (None, _) => debug!("map moved while unmounted, ignored"),
                    (Some(_), Err(e)) => warn!(lat, lng, error = %e, "map reported invalid center"),
                }
            }

            Event::MapRecenter => {
                if let Some(map) = model.map.as_mut() {
                    let command = map.recenter();
                    debug!(revision = command.revision, "recentered on selection");
                }
            }

            Event::MapUnmounted => model.map = None,

            Event::DismissMessage => {
                model.clear_error();
                model.notice = None;
            }
        }

        if model.regions.is_initialized() && model.regions.revision() != revision {
            Self::persist_regions(model, caps);
        }
        Self::sync_viewport(model);
        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let selection = model.regions.selection().map(|selection| SelectionView {
            region: selection.region().clone(),
            is_temporary: selection.is_temporary(),
        });

        let data_query = model.current_coordinate().map(|coordinate| DataQuery {
            lat: coordinate.lat(),
            lon: coordinate.lon(),
            radius_km: model.config.data_radius_km,
            result_count: model.config.data_result_count,
        });

        let viewport = model.map.as_ref().map(|map| {
            let command = map.command();
            let center = map.center();
            ViewportView {
                lat: center.lat(),
                lng: center.lon(),
                zoom: map.zoom(),
                follow_mode: map.mode(),
                revision: command.revision,
            }
        });

        let results = model
            .search
            .results
            .iter()
            .enumerate()
            .map(|(index, candidate)| SearchResultView {
                index,
                name: candidate.name.clone(),
                label: candidate.label(),
                kind: candidate.kind.clone(),
                population: candidate.population,
            })
            .collect();

        ViewModel {
            ready: model.regions.is_initialized(),
            selection,
            saved_regions: Self::region_view(model),
            search: SearchView {
                query: model.search.query.clone(),
                results,
                is_searching: model.search.is_searching(),
            },
            is_locating: model.geolocation.is_locating(),
            viewport,
            data_query,
            error: model.active_error.as_ref().map(UserFacingError::from),
            notice: model.notice.clone(),
        }
    }
}
