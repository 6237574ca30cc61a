use crux_core::testing::AppTester;
use shared::capabilities::{GeolocationError, GeolocationOperation, Position};
use shared::{App, Effect, Event, Model};

fn boot(app: &AppTester<App, Effect>, model: &mut Model) {
    let update = app.update(Event::Startup, model);
    let reads = update
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::KeyValue(_)))
        .count();
    assert_eq!(reads, 2);

    app.update(Event::RegionsLoaded(Ok(None)), model);
    assert!(!model.regions.is_initialized());
    let update = app.update(Event::ActiveRegionLoaded(Ok(None)), model);
    assert!(model.regions.is_initialized());
    assert!(update.effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));
}

fn locate(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    persist: bool,
    fix: Result<Position, GeolocationError>,
) {
    let update = app.update(Event::UseCurrentLocation { persist }, model);
    let mut request = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Geolocation(request) => Some(request),
            _ => None,
        })
        .expect("geolocation request");
    assert!(matches!(
        request.operation,
        GeolocationOperation::CurrentPosition { timeout_ms: 8_000 }
    ));
    assert!(app.view(model).is_locating);

    let update = app.resolve(&mut request, fix).expect("resolve position");
    for event in update.events {
        app.update(event, model);
    }
    assert!(!app.view(model).is_locating);
}

fn position(latitude: f64, longitude: f64) -> Result<Position, GeolocationError> {
    Ok(Position {
        latitude,
        longitude,
        accuracy_m: Some(15.0),
    })
}

#[test]
fn first_launch_seeds_default_region() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);

    let view = app.view(&model);
    assert!(view.ready);
    let selection = view.selection.expect("selection after bootstrap");
    assert_eq!(selection.region.id.as_str(), "default");
    assert!(!selection.is_temporary);
    assert_eq!(view.saved_regions.len(), 1);
    assert!(view.saved_regions[0].is_active);
}

#[test]
fn startup_is_idempotent() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::Startup, &mut model);
    let update = app.update(Event::Startup, &mut model);
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));
}

#[test]
fn unreadable_storage_starts_empty() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::RegionsLoaded(Ok(Some(b"not json".to_vec()))), &mut model);
    app.update(Event::ActiveRegionLoaded(Ok(None)), &mut model);

    let view = app.view(&model);
    assert_eq!(
        view.selection.map(|s| s.region.id.to_string()).as_deref(),
        Some("default")
    );
    assert!(view.error.is_some());

    app.update(Event::DismissMessage, &mut model);
    assert!(app.view(&model).error.is_none());
}

#[test]
fn stored_regions_are_restored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    let stored = br#"[
        {"id":"portland-1","name":"Portland","label":"Portland, OR","lat":45.5152,"lon":-122.6784},
        {"id":"austin-2","name":"Austin","label":"Austin, TX","lat":30.2672,"lon":-97.7431}
    ]"#;
    app.update(Event::RegionsLoaded(Ok(Some(stored.to_vec()))), &mut model);
    let update = app.update(
        Event::ActiveRegionLoaded(Ok(Some(br#""austin-2""#.to_vec()))),
        &mut model,
    );
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));

    let view = app.view(&model);
    assert_eq!(view.selection.unwrap().region.name, "Austin");
    assert_eq!(view.saved_regions.len(), 2);
    let query = view.data_query.unwrap();
    assert_eq!((query.lat, query.lon), (30.2672, -97.7431));
    assert_eq!(query.result_count, 50);
}

#[test]
fn temporary_location_then_persist() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);

    locate(&app, &mut model, false, position(47.6062, -122.3321));
    let view = app.view(&model);
    let selection = view.selection.unwrap();
    assert!(selection.is_temporary);
    assert_eq!(selection.region.id.as_str(), "geo:47.606,-122.332");
    assert!(model.regions.active_id().is_none());
    assert_eq!(view.saved_regions.len(), 1);

    let update = app.update(Event::PersistTemporary, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));
    let view = app.view(&model);
    assert!(!view.selection.unwrap().is_temporary);
    assert_eq!(view.saved_regions[0].id, "geo:47.606,-122.332");
    assert!(view.saved_regions[0].is_active);
}

#[test]
fn denied_location_falls_back_with_notice() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);
    locate(&app, &mut model, true, position(47.6062, -122.3321));

    locate(&app, &mut model, false, Err(GeolocationError::PermissionDenied));
    let view = app.view(&model);
    let selection = view.selection.unwrap();
    assert_eq!(selection.region.id.as_str(), "default");
    assert!(selection.is_temporary);
    assert!(view.notice.is_some());
}

#[test]
fn select_and_remove_saved_regions() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);
    locate(&app, &mut model, true, position(10.0, 10.0));
    locate(&app, &mut model, true, position(20.0, 20.0));
    assert_eq!(
        model.regions.active_id().map(|id| id.to_string()).as_deref(),
        Some("geo:20.000,20.000")
    );

    app.update(
        Event::SelectRegion {
            id: "geo:10.000,10.000".into(),
        },
        &mut model,
    );
    assert_eq!(
        model.regions.active_id().map(|id| id.to_string()).as_deref(),
        Some("geo:10.000,10.000")
    );

    let update = app.update(
        Event::SelectRegion {
            id: "nowhere".into(),
        },
        &mut model,
    );
    assert!(!update.effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));
    assert_eq!(
        model.regions.active_id().map(|id| id.to_string()).as_deref(),
        Some("geo:10.000,10.000")
    );

    app.update(
        Event::RemoveRegion {
            id: "geo:10.000,10.000".into(),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert_eq!(view.saved_regions.len(), 2);
    assert_eq!(
        view.selection.unwrap().region.id.as_str(),
        "geo:20.000,20.000"
    );
}

#[test]
fn removing_everything_reseeds_default() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);

    app.update(
        Event::RemoveRegion {
            id: "default".into(),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert_eq!(view.selection.unwrap().region.id.as_str(), "default");
    assert_eq!(view.saved_regions.len(), 1);
}

#[test]
fn failed_write_is_surfaced_without_rollback() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);
    locate(&app, &mut model, true, position(10.0, 10.0));

    app.update(
        Event::RegionsPersisted {
            key: shared::capabilities::StorageKey::Regions,
            result: Err(shared::capabilities::KeyValueError::Io {
                message: "disk full".into(),
            }),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert!(view.error.unwrap().retryable);
    assert_eq!(view.saved_regions.len(), 2);
}

const STORED: &[u8] = br#"[
    {"id":"portland-1","name":"Portland","label":"Portland, OR","lat":45.5152,"lon":-122.6784},
    {"id":"austin-2","name":"Austin","label":"Austin, TX","lat":30.2672,"lon":-97.7431}
]"#;

fn request_location(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    persist: bool,
) -> crux_core::Request<GeolocationOperation> {
    app.update(Event::UseCurrentLocation { persist }, model)
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Geolocation(request) => Some(request),
            _ => None,
        })
        .expect("geolocation request")
}

/// Resolves the request and returns every effect the answer produced.
fn answer(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    request: &mut crux_core::Request<GeolocationOperation>,
    lat: f64,
    lon: f64,
) -> Vec<Effect> {
    let update = app
        .resolve(request, position(lat, lon))
        .expect("resolve position");
    let mut effects = Vec::new();
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

#[test]
fn removing_temporary_selection_falls_back_to_saved() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::RegionsLoaded(Ok(Some(STORED.to_vec()))), &mut model);
    app.update(
        Event::ActiveRegionLoaded(Ok(Some(br#""portland-1""#.to_vec()))),
        &mut model,
    );

    locate(&app, &mut model, false, position(5.0, 5.0));
    assert!(app.view(&model).selection.unwrap().is_temporary);

    app.update(
        Event::RemoveRegion {
            id: "geo:5.000,5.000".into(),
        },
        &mut model,
    );
    let view = app.view(&model);
    let selection = view.selection.expect("selection after removing temporary");
    assert_eq!(selection.region.id.as_str(), "portland-1");
    assert!(!selection.is_temporary);
    assert_eq!(view.saved_regions.len(), 2);
    assert!(view.data_query.is_some());
}

#[test]
fn save_before_storage_read_keeps_stored_favorites() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::Startup, &mut model);

    let mut request = request_location(&app, &mut model, true);
    let effects = answer(&app, &mut model, &mut request, 5.0, 5.0);
    assert!(!effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));

    app.update(Event::RegionsLoaded(Ok(Some(STORED.to_vec()))), &mut model);
    let update = app.update(
        Event::ActiveRegionLoaded(Ok(Some(br#""austin-2""#.to_vec()))),
        &mut model,
    );
    let writes = update
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::KeyValue(_)))
        .count();
    assert_eq!(writes, 2);

    let view = app.view(&model);
    let saved: Vec<&str> = view.saved_regions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(saved, vec!["geo:5.000,5.000", "portland-1", "austin-2"]);
    assert_eq!(
        view.selection.unwrap().region.id.as_str(),
        "geo:5.000,5.000"
    );
}

#[test]
fn superseded_location_request_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);

    let mut first = request_location(&app, &mut model, true);
    let mut second = request_location(&app, &mut model, true);

    let effects = answer(&app, &mut model, &mut first, 10.0, 10.0);
    assert!(!effects.iter().any(|e| matches!(e, Effect::KeyValue(_))));
    let view = app.view(&model);
    assert!(view.is_locating);
    assert_eq!(view.selection.unwrap().region.id.as_str(), "default");

    answer(&app, &mut model, &mut second, 20.0, 20.0);
    let view = app.view(&model);
    assert!(!view.is_locating);
    assert_eq!(
        view.selection.unwrap().region.id.as_str(),
        "geo:20.000,20.000"
    );
    assert_eq!(view.saved_regions.len(), 2);
}

#[test]
fn location_answer_after_close_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    boot(&app, &mut model);

    let mut request = request_location(&app, &mut model, true);
    app.update(Event::SearchClosed, &mut model);
    assert!(!app.view(&model).is_locating);

    answer(&app, &mut model, &mut request, 10.0, 10.0);
    let view = app.view(&model);
    assert_eq!(view.selection.unwrap().region.id.as_str(), "default");
    assert_eq!(view.saved_regions.len(), 1);
}
