use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use crux_kv::error::KeyValueError;

/// Result handed back by `KeyValue::get` and `KeyValue::set`.
pub type KvResult = Result<Option<Vec<u8>>, KeyValueError>;

pub const MAX_VALUE_SIZE: usize = 256 * 1024;

/// The two keys the region store persists under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Ordered list of at most six saved regions, most recent first.
    Regions,
    /// Nullable id of the active saved region.
    ActiveRegion,
}

impl StorageKey {
    pub const fn raw(self) -> &'static str {
        match self {
            StorageKey::Regions => "regions",
            StorageKey::ActiveRegion => "regions:active",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.raw())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("reading '{key}' failed: {message}")]
    Read { key: &'static str, message: String },

    #[error("writing '{key}' failed: {message}")]
    Write { key: &'static str, message: String },

    #[error("stored value for '{key}' is unreadable: {message}")]
    Decode { key: &'static str, message: String },

    #[error("value for '{key}' could not be encoded: {message}")]
    Encode { key: &'static str, message: String },
}

impl StorageError {
    pub fn read(key: StorageKey, error: &KeyValueError) -> Self {
        StorageError::Read {
            key: key.raw(),
            message: error.to_string(),
        }
    }

    pub fn write(key: StorageKey, error: &KeyValueError) -> Self {
        StorageError::Write {
            key: key.raw(),
            message: error.to_string(),
        }
    }
}

pub fn encode<T: Serialize>(key: StorageKey, value: &T) -> Result<Vec<u8>, StorageError> {
    let data = serde_json::to_vec(value).map_err(|e| StorageError::Encode {
        key: key.raw(),
        message: e.to_string(),
    })?;
    if data.len() > MAX_VALUE_SIZE {
        return Err(StorageError::Encode {
            key: key.raw(),
            message: format!("{} bytes exceeds maximum of {MAX_VALUE_SIZE}", data.len()),
        });
    }
    Ok(data)
}

/// A missing key and an empty value both decode to `None`.
pub fn decode<T: DeserializeOwned>(
    key: StorageKey,
    bytes: Option<&[u8]>,
) -> Result<Option<T>, StorageError> {
    match bytes {
        None => Ok(None),
        Some(data) if data.is_empty() => Ok(None),
        Some(data) => serde_json::from_slice(data)
            .map(Some)
            .map_err(|e| StorageError::Decode {
                key: key.raw(),
                message: e.to_string(),
            }),
    }
}

/// Turns a `KeyValue::get` result straight into a typed value.
pub fn read_value<T: DeserializeOwned>(
    key: StorageKey,
    result: &KvResult,
) -> Result<Option<T>, StorageError> {
    match result {
        Ok(bytes) => decode(key, bytes.as_deref()),
        Err(e) => Err(StorageError::read(key, e)),
    }
}
