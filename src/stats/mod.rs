//! Metric normalization pipeline.
//!
//! A raw [`StatsDocument`] goes through four pure steps before it is written
//! out:
//!
//! 1. [`normalize_container_stats`] / [`host_counters`] bring API-version
//!    dependent substructures into one canonical shape,
//! 2. [`flatten`] turns the tree into dotted paths,
//! 3. [`MetricFilter`] decides which paths are published,
//! 4. [`translate`] maps each kept path to its canonical metric name.
//!
//! [`prepare`] chains steps 2 to 4.

mod document;
mod error;
mod filter;
mod flatten;
mod names;
mod normalize;

pub use document::{ApiVersion, Scalar, StatsDocument};
pub use error::SchemaError;
pub use filter::{
    DEFAULT_EXCLUDE_RULES, DEFAULT_INCLUDE_RULES, FilterRule, MetricFilter, RuleError,
    glob_to_regex,
};
pub use flatten::{FlatMetric, HOST_SEGMENT, NAMESPACE, flatten};
pub use names::{METRIC_NAMES, canonical_name, translate};
pub use normalize::{
    CONTAINER_STATES_MIN_API_VERSION, HOST_COUNTERS_MIN_API_VERSION, NETWORKS_MIN_API_VERSION,
    host_counters, normalize_container_stats,
};

/// A metric that passed the filter, under its canonical name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMetric {
    pub name: String,
    pub value: Scalar,
}

/// Flattens a normalized document below `segment`, drops filtered paths and
/// names the rest. Output follows the flattener's key order.
pub fn prepare(doc: &StatsDocument, segment: &str, filter: &MetricFilter) -> Vec<NamedMetric> {
    flatten(doc, segment)
        .into_iter()
        .filter(|metric| filter.accepts(&metric.path))
        .map(|metric| NamedMetric {
            name: translate(&metric.path),
            value: metric.value,
        })
        .collect()
}
