//! Day graph core.
//!
//! Buckets a long sample series into UTC days, maps samples into per-day
//! panel coordinates, and keeps a scrolling day strip in sync with a
//! selected date. Rendering, the picker widget and the scroll container live
//! in the `daygraph-tui` binary.

pub mod bucket;
pub mod config;
pub mod error;
pub mod mapper;
pub mod models;
pub mod store;
pub mod sync;

pub use error::{GraphError, GraphResult};
pub use models::{Day, DayId, DayList, Sample};
pub use sync::{LayoutReport, ScrollCommand, ScrollSyncController};
