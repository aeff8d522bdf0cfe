// Domain types and value objects
pub mod access_key;
pub mod asset;
pub mod chart_series;
pub mod tiers;
pub mod time_window;

// Re-export commonly used types
pub use access_key::{AccessKey, ExtensionRates};
pub use asset::Asset;
pub use chart_series::{ChartPoint, ChartSeries, SeriesOrder};
pub use time_window::TimeWindow;
