pub mod cells;
pub mod filter;
pub mod history;
pub mod label;
pub mod records;
pub mod schema;
pub mod series;

pub use filter::{SeriesFilter, TypeFilter};
pub use history::{WeightHistory, last_reading, soaps_by_recent_activity};
pub use label::make_label;
pub use records::{BatchRecord, SoapKey, SurfaceArea, UNCATEGORIZED, WeightReading};
pub use schema::sheets;
pub use series::{
    RetainedSeries, SeriesError, SeriesPoint, SeriesSet, available_types, build_retained_series,
};
