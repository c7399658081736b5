use thiserror::Error;
use waypoint_core::HistoryError;
use waypoint_geocode::GeocodeError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolverError {
    #[error("no result at index {index} ({len} shown)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("nothing has been selected yet")]
    NothingSelected,

    #[error("favorite name must not be empty")]
    EmptyFavoriteName,

    #[error("invalid input: {0}")]
    InvalidInput(#[source] GeocodeError),

    #[error(transparent)]
    History(#[from] HistoryError),

    /// The resolver task has stopped.
    #[error("location resolver is closed")]
    Closed,
}
