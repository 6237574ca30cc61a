//! Resolving regions from free-text search and from the device position.
//!
//! Neither path does I/O here. The app layer asks the shell for timers, HTTP
//! and position fixes, and feeds the answers back through these types, which
//! decide what is still current and what is stale.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::capabilities::{GeolocationError, GeolocationResult};
use crate::region::{Coordinate, CoordinateError, Region, RegionId};

pub const SEARCH_CACHE_CAPACITY: usize = 20;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search returned HTTP {0}")]
    Status(u16),
    #[error("search request failed: {0}")]
    Transport(String),
}

/// One entry of the place-name service response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    #[serde(alias = "display_name")]
    pub name: String,
    #[serde(default, alias = "admin1", alias = "state")]
    pub admin: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lng")]
    pub lon: f64,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
}

impl PlaceCandidate {
    pub fn label(&self) -> String {
        match self.admin.as_deref().map(str::trim) {
            Some(admin) if !admin.is_empty() => format!("{}, {admin}", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn coordinate(&self) -> Result<Coordinate, CoordinateError> {
        Coordinate::new(self.lat, self.lon)
    }

    /// A new region for this candidate, id-stamped with the pick time.
    pub fn to_region(&self, picked_at_ms: u64) -> Result<Region, CoordinateError> {
        let coordinate = self.coordinate()?;
        Ok(Region::new(
            RegionId::for_search(&self.name, picked_at_ms),
            self.name.clone(),
            self.label(),
            coordinate,
        )
        .with_country(self.country.clone())
        .with_admin(self.admin.clone()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchBody {
    List(Vec<serde_json::Value>),
    Wrapped {
        #[serde(default)]
        results: Vec<serde_json::Value>,
    },
}

/// Accepts a bare array or `{"results": [...]}`. Anything unreadable, and any
/// entry without a usable name and coordinate, counts as no result.
pub fn parse_search_body(body: &[u8]) -> Vec<PlaceCandidate> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }
    let entries = match serde_json::from_slice::<SearchBody>(body) {
        Ok(SearchBody::List(entries) | SearchBody::Wrapped { results: entries }) => entries,
        Err(e) => {
            warn!(error = %e, "malformed search response, treating as no results");
            return Vec::new();
        }
    };

    let total = entries.len();
    let candidates: Vec<PlaceCandidate> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<PlaceCandidate>(entry).ok())
        .filter(|c| !c.name.trim().is_empty() && c.coordinate().is_ok())
        .collect();
    if candidates.len() != total {
        debug!(total, kept = candidates.len(), "skipped unusable search entries");
    }
    candidates
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceAction {
    /// Start a timer for `generation`; `replaces` names the timer it supersedes.
    Schedule {
        generation: u64,
        delay_ms: u64,
        replaces: Option<u64>,
    },
    /// Query too short: nothing scheduled, results should be cleared.
    Cleared { cancelled: Option<u64> },
}

/// Generation-tagged debounce for the search box.
///
/// Every keystroke gets a new generation. A timer only fires a search if its
/// generation is still the pending one, and a response is only applied if it
/// answers the latest issued generation.
#[derive(Debug, Default)]
pub struct SearchDebouncer {
    generation: u64,
    pending: Option<(u64, String)>,
    issued: Option<(u64, String)>,
}

impl SearchDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&mut self, query: &str, min_chars: usize, delay_ms: u64) -> DebounceAction {
        self.generation += 1;
        let replaced = self.pending.take().map(|(generation, _)| generation);
        let query = query.trim();

        if query.chars().count() < min_chars {
            // Anything still in flight answers a query the user has abandoned.
            self.issued = None;
            return DebounceAction::Cleared { cancelled: replaced };
        }

        self.pending = Some((self.generation, query.to_string()));
        DebounceAction::Schedule {
            generation: self.generation,
            delay_ms,
            replaces: replaced,
        }
    }

    /// The query to send now, if `generation` is still pending.
    pub fn fire(&mut self, generation: u64) -> Option<String> {
        match &self.pending {
            Some((pending, _)) if *pending == generation => {
                let (generation, query) = self.pending.take()?;
                self.issued = Some((generation, query.clone()));
                Some(query)
            }
            _ => {
                debug!(generation, "stale debounce timer ignored");
                None
            }
        }
    }

    /// The query a response answers, if it is the latest issued one. Each
    /// issued generation is accepted at most once.
    pub fn accept(&mut self, generation: u64) -> Option<String> {
        match &self.issued {
            Some((issued, _)) if *issued == generation => {
                self.issued.take().map(|(_, query)| query)
            }
            _ => {
                debug!(generation, "stale search response dropped");
                None
            }
        }
    }

    /// Teardown: forget the pending timer and anything in flight. Returns the
    /// pending timer's generation so it can be cancelled.
    pub fn cancel(&mut self) -> Option<u64> {
        self.generation += 1;
        self.issued = None;
        self.pending.take().map(|(generation, _)| generation)
    }

    pub fn pending_generation(&self) -> Option<u64> {
        self.pending.as_ref().map(|(generation, _)| *generation)
    }

    pub fn in_flight(&self) -> bool {
        self.issued.is_some()
    }
}

/// Recently answered queries, so retyping a query does not hit the network.
pub struct SearchCache {
    entries: LruCache<String, Vec<PlaceCandidate>>,
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, query: &str) -> Option<Vec<PlaceCandidate>> {
        self.entries.get(&Self::normalize(query)).cloned()
    }

    pub fn insert(&mut self, query: &str, candidates: Vec<PlaceCandidate>) {
        self.entries.put(Self::normalize(query), candidates);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn normalize(query: &str) -> String {
        query.trim().to_lowercase()
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(SEARCH_CACHE_CAPACITY)
    }
}

impl fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchCache")
            .field("len", &self.entries.len())
            .field("cap", &self.entries.cap())
            .finish()
    }
}

/// A position to act on. `fallback` is set when the reference coordinate was
/// substituted for a failed fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub coordinate: Coordinate,
    pub fallback: Option<GeolocationError>,
}

impl GeoFix {
    pub fn from_result(result: GeolocationResult) -> Self {
        let error = match result {
            Ok(position) => match Coordinate::new(position.latitude, position.longitude) {
                Ok(coordinate) => {
                    return Self {
                        coordinate,
                        fallback: None,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "device reported an invalid position");
                    GeolocationError::PositionUnavailable
                }
            },
            Err(e) => e,
        };
        debug!(error = %error, "geolocation failed, using reference coordinate");
        Self {
            coordinate: Coordinate::reference(),
            fallback: Some(error),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Last-request-wins bookkeeping for "use current location".
#[derive(Debug, Default)]
pub struct GeolocationTracker {
    last_id: u64,
    outstanding: Option<u64>,
}

impl GeolocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a request, superseding any outstanding one.
    pub fn begin(&mut self) -> u64 {
        self.last_id += 1;
        if let Some(superseded) = self.outstanding.replace(self.last_id) {
            debug!(superseded, request_id = self.last_id, "geolocation request superseded");
        }
        self.last_id
    }

    /// `None` for superseded or cancelled requests.
    pub fn complete(&mut self, request_id: u64, result: GeolocationResult) -> Option<GeoFix> {
        if self.outstanding != Some(request_id) {
            debug!(request_id, "ignoring superseded geolocation result");
            return None;
        }
        self.outstanding = None;
        Some(GeoFix::from_result(result))
    }

    pub fn is_locating(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn cancel(&mut self) {
        self.outstanding = None;
    }
}
