use crux_core::testing::AppTester;
use shared::capabilities::Position;
use shared::{App, Effect, Event, FollowMode, Model, MoveOrigin};

fn booted() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::RegionsLoaded(Ok(None)), &mut model);
    app.update(Event::ActiveRegionLoaded(Ok(None)), &mut model);
    (app, model)
}

fn select_position(app: &AppTester<App, Effect>, model: &mut Model, lat: f64, lon: f64) {
    let update = app.update(Event::UseCurrentLocation { persist: true }, model);
    let mut request = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Geolocation(request) => Some(request),
            _ => None,
        })
        .expect("geolocation request");
    let update = app
        .resolve(
            &mut request,
            Ok(Position {
                latitude: lat,
                longitude: lon,
                accuracy_m: None,
            }),
        )
        .expect("resolve position");
    for event in update.events {
        app.update(event, model);
    }
}

fn user_pan(app: &AppTester<App, Effect>, model: &mut Model, lat: f64, lng: f64) {
    app.update(
        Event::MapMoved {
            lat,
            lng,
            zoom: Some(12.0),
            origin: MoveOrigin::User,
        },
        model,
    );
}

#[test]
fn no_viewport_until_mounted() {
    let (app, model) = booted();
    assert!(app.view(&model).viewport.is_none());
}

#[test]
fn mounts_following_on_current_selection() {
    let (app, mut model) = booted();
    app.update(Event::MapMounted, &mut model);

    let viewport = app.view(&model).viewport.expect("mounted");
    assert_eq!(viewport.follow_mode, FollowMode::Following);
    assert_eq!((viewport.lat, viewport.lng), (41.8781, -87.6298));
    assert_eq!(viewport.zoom, 10.0);
}

#[test]
fn follow_pan_recenter() {
    let (app, mut model) = booted();
    app.update(Event::MapMounted, &mut model);

    select_position(&app, &mut model, 40.7128, -74.006);
    let viewport = app.view(&model).viewport.unwrap();
    assert_eq!((viewport.lat, viewport.lng), (40.7128, -74.006));

    user_pan(&app, &mut model, 40.8, -74.1);
    assert_eq!(
        app.view(&model).viewport.unwrap().follow_mode,
        FollowMode::Panned
    );

    select_position(&app, &mut model, 34.0522, -118.2437);
    let viewport = app.view(&model).viewport.unwrap();
    assert_eq!((viewport.lat, viewport.lng), (40.8, -74.1));
    assert_eq!(viewport.follow_mode, FollowMode::Panned);
    assert_eq!(
        app.view(&model).data_query.map(|q| (q.lat, q.lon)),
        Some((34.0522, -118.2437))
    );

    app.update(Event::MapRecenter, &mut model);
    let viewport = app.view(&model).viewport.unwrap();
    assert_eq!((viewport.lat, viewport.lng), (34.0522, -118.2437));
    assert_eq!(viewport.follow_mode, FollowMode::Following);
    assert_eq!(viewport.zoom, 12.0);
}

#[test]
fn system_moves_do_not_oscillate() {
    let (app, mut model) = booted();
    app.update(Event::MapMounted, &mut model);
    select_position(&app, &mut model, 40.7128, -74.006);
    let issued = app.view(&model).viewport.unwrap().revision;

    // The map animates to the command and reports where it landed.
    for step in 0..5 {
        app.update(
            Event::MapMoved {
                lat: 40.7128 + f64::from(step) * 1e-7,
                lng: -74.006,
                zoom: None,
                origin: MoveOrigin::System,
            },
            &mut model,
        );
        let viewport = app.view(&model).viewport.unwrap();
        assert_eq!(viewport.follow_mode, FollowMode::Following);
        assert_eq!(viewport.revision, issued);
    }

    app.update(Event::DismissMessage, &mut model);
    assert_eq!(app.view(&model).viewport.unwrap().revision, issued);
}

#[test]
fn invalid_reported_center_is_ignored() {
    let (app, mut model) = booted();
    app.update(Event::MapMounted, &mut model);
    app.update(
        Event::MapMoved {
            lat: 120.0,
            lng: 0.0,
            zoom: None,
            origin: MoveOrigin::User,
        },
        &mut model,
    );
    let viewport = app.view(&model).viewport.unwrap();
    assert_eq!(viewport.follow_mode, FollowMode::Following);
    assert_eq!(viewport.lat, 41.8781);
}

#[test]
fn unmount_drops_viewport_and_remount_follows_again() {
    let (app, mut model) = booted();
    app.update(Event::MapMounted, &mut model);
    user_pan(&app, &mut model, 10.0, 10.0);

    app.update(Event::MapUnmounted, &mut model);
    assert!(app.view(&model).viewport.is_none());
    user_pan(&app, &mut model, 11.0, 11.0);
    assert!(model.map.is_none());

    select_position(&app, &mut model, 51.5074, -0.1278);
    app.update(Event::MapMounted, &mut model);
    let viewport = app.view(&model).viewport.unwrap();
    assert_eq!(viewport.follow_mode, FollowMode::Following);
    assert_eq!((viewport.lat, viewport.lng), (51.5074, -0.1278));
}
