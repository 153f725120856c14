//! Depth-first flattening of a [`StatsDocument`] into dotted paths.
//!
//! Mapping keys and sequence indices each add one segment; every scalar leaf
//! yields exactly one [`FlatMetric`]. Mappings iterate in key order, so the
//! output order is stable across runs.
//!
//! Keys are not escaped. A key that itself contains a `.` produces the same
//! path as the equivalent nesting (`{"a.b": 1}` and `{"a": {"b": 2}}` both
//! flatten to `a.b`); both leaves are still emitted, in key order.

use super::document::{Scalar, StatsDocument};

/// Namespace tag that starts every flattened path.
pub const NAMESPACE: &str = "docker-librato";

/// Second path segment used for host-level documents instead of a container id.
pub const HOST_SEGMENT: &str = "host";

/// A single flattened leaf: dotted path and scalar value.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatMetric {
    pub path: String,
    pub value: Scalar,
}

/// Flattens `doc` below the two-segment prefix `NAMESPACE.<segment>`.
///
/// `segment` is the container's short id, or [`HOST_SEGMENT`] for
/// host-level documents. Empty mappings and sequences contribute nothing.
///
/// # Examples
///
/// ```
/// # use docker_librato::stats::{flatten, StatsDocument};
/// let doc = StatsDocument::from(serde_json::json!({
///     "cpu_stats": {"cpu_usage": {"total_usage": 42}}
/// }));
/// let metrics = flatten(&doc, "abcdef012345");
/// assert_eq!(
///     metrics[0].path,
///     "docker-librato.abcdef012345.cpu_stats.cpu_usage.total_usage"
/// );
/// ```
pub fn flatten(doc: &StatsDocument, segment: &str) -> Vec<FlatMetric> {
    let mut out = Vec::with_capacity(doc.leaf_count());
    let mut path = format!("{NAMESPACE}.{segment}");
    visit(doc, &mut path, &mut out);
    out
}

fn visit(node: &StatsDocument, path: &mut String, out: &mut Vec<FlatMetric>) {
    match node {
        StatsDocument::Mapping(map) => {
            for (key, child) in map {
                descend(child, key, path, out);
            }
        }
        StatsDocument::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                descend(child, &index.to_string(), path, out);
            }
        }
        StatsDocument::Scalar(value) => out.push(FlatMetric {
            path: path.clone(),
            value: value.clone(),
        }),
    }
}

fn descend(child: &StatsDocument, segment: &str, path: &mut String, out: &mut Vec<FlatMetric>) {
    let len = path.len();
    path.push('.');
    path.push_str(segment);
    visit(child, path, out);
    path.truncate(len);
}
