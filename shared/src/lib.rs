#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod event;
pub mod location;
pub mod map_view;
pub mod model;
pub mod region;
pub mod region_store;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::CoreConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use error::{AppError, ErrorKind, ErrorSeverity, UserFacingError};
pub use event::Event;
pub use map_view::{FollowMode, MapViewController, MoveOrigin, ViewportCommand};
pub use model::{Model, ViewModel};
pub use region::{Coordinate, Region, RegionId};
pub use region_store::{RegionStore, Selection, MAX_SAVED_REGIONS};
