//! Error types for the day graph core.

use chrono::{DateTime, NaiveDate, Utc};

/// Result type for core operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Conditions the core reports instead of panicking.
///
/// None of these are fatal. An empty day list is a valid zero-day state,
/// and the sync layer answers the others by declining to act.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("No days loaded")]
    EmptyDayList,

    #[error("No day loaded for {0}")]
    DateOutOfRange(NaiveDate),

    #[error("Viewport has not been laid out yet")]
    LayoutNotReady,

    #[error("Sample at {got} precedes the last loaded sample at {last}")]
    OutOfOrder {
        last: DateTime<Utc>,
        got: DateTime<Utc>,
    },
}
