mod geolocation;
mod http;
mod kv;
mod timer;

pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult, Position,
    DEFAULT_GEOLOCATION_TIMEOUT_MS,
};
pub use self::http::{search_body, HttpError, SearchEndpoint, SearchHttpResult};
pub use self::kv::{
    decode, encode, read_value, KeyValueError, KvResult, StorageError, StorageKey,
};
pub use self::timer::{Timer, TimerOperation, TimerOutput};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub key_value: KeyValue<Event>,
    pub render: Render<Event>,
    pub geolocation: Geolocation<Event>,
    pub timer: Timer<Event>,
}
