use std::path::PathBuf;

use thiserror::Error;

/// Boxed failure reported by a secure render backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("class weights sum to {0}, expected 1.0")]
    WeightSum(f64),

    #[error("{class} weight {value} is not a finite non-negative number")]
    InvalidWeight { class: &'static str, value: f64 },

    #[error("{class} frequency for offset {offset} is {value}, expected a finite non-negative number")]
    InvalidFrequency {
        class: &'static str,
        offset: usize,
        value: f64,
    },

    #[error("{class} offset {offset} is outside the printable ASCII range")]
    OffsetOutOfRange { class: &'static str, offset: usize },

    #[error("{class} table key {key:?} must be a single printable ASCII character")]
    InvalidKey { class: &'static str, key: String },

    #[error("failed to read frequency model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse frequency model: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EstimateError {
    #[error("width table has {actual} entries but the model needs at least {required}")]
    WidthTableTooShort { required: usize, actual: usize },
}

/// Failures surfaced by the trusted render path. The core never retries or
/// interprets these; they are handed back to the caller unchanged.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("secure render path rejected key handle {0}")]
    UnknownKeyHandle(i32),

    #[error("secure render path failed: {0}")]
    Backend(#[source] BackendError),
}

impl RenderError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BackendError>,
    {
        RenderError::Backend(err.into())
    }
}
