// Core modules
pub mod metrics;
pub mod types;

/// Core prelude module that re-exports commonly used types
pub mod prelude {
    pub use super::metrics::{Metric, MetricSeries};
    pub use super::types::{round2, ByteSize, Frequency, Percentage, TypedValue};
}
