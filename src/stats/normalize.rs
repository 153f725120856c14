//! Restructures API-version-dependent parts of a statistics document.
//!
//! The flattener and the name table only know one shape per metric family:
//!
//! - `blkio_stats.<category>` is a mapping from lowercased operation
//!   (`read`, `write`, `sync`, `async`, `total`) to value. The runtime reports
//!   it as a list of `{op, value}` records, one per device and operation;
//!   records for the same operation are summed across devices.
//! - `network` is a single mapping of counters. From API `1.21` the runtime
//!   reports a `networks` mapping keyed by interface instead; every counter is
//!   summed across interfaces and the per-interface structure is discarded.
//! - Host counters are picked out of the daemon info document, gated on the
//!   API version that introduced them.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::SchemaError;
use super::document::{ApiVersion, Scalar, StatsDocument};

/// First API version that reports per-interface `networks`.
pub const NETWORKS_MIN_API_VERSION: &str = "1.21";
/// First API version whose host totals are published.
pub const HOST_COUNTERS_MIN_API_VERSION: &str = "1.21";
/// First API version that reports container counts per state.
pub const CONTAINER_STATES_MIN_API_VERSION: &str = "1.22";

const BLKIO_KEY: &str = "blkio_stats";
const NETWORKS_KEY: &str = "networks";
const NETWORK_KEY: &str = "network";

const HOST_TOTAL_KEYS: [&str; 2] = ["Containers", "Images"];
const CONTAINER_STATE_KEYS: [&str; 3] =
    ["ContainersPaused", "ContainersRunning", "ContainersStopped"];

type Mapping = BTreeMap<String, StatsDocument>;

/// Brings a per-container statistics document into canonical shape.
///
/// # Errors
///
/// Returns a [`SchemaError`] if the document is not a mapping, or if the
/// block I/O or network substructures do not have the expected shape.
pub fn normalize_container_stats(
    doc: StatsDocument,
    version: &ApiVersion,
) -> Result<StatsDocument, SchemaError> {
    let mut root = into_mapping(doc, "")?;

    if let Some(blkio) = root.remove(BLKIO_KEY) {
        root.insert(BLKIO_KEY.to_owned(), normalize_blkio(blkio)?);
    }

    if version.at_least(NETWORKS_MIN_API_VERSION) {
        if let Some(networks) = root.remove(NETWORKS_KEY) {
            root.insert(NETWORK_KEY.to_owned(), aggregate_networks(&networks)?);
        }
    }

    Ok(StatsDocument::Mapping(root))
}

/// Extracts the host-level counters from a daemon info document.
///
/// Below [`HOST_COUNTERS_MIN_API_VERSION`] the result is an empty mapping;
/// per-state container counts are only added from
/// [`CONTAINER_STATES_MIN_API_VERSION`] on. Counters missing from `info` are
/// skipped.
///
/// # Errors
///
/// Returns a [`SchemaError`] if `info` is not a mapping or a selected counter
/// is not numeric.
pub fn host_counters(
    info: &StatsDocument,
    version: &ApiVersion,
) -> Result<StatsDocument, SchemaError> {
    let info = info.as_mapping().ok_or_else(|| SchemaError::NotAMapping {
        path: String::new(),
        found: info.kind(),
    })?;

    let mut counters = Mapping::new();
    if !version.at_least(HOST_COUNTERS_MIN_API_VERSION) {
        return Ok(StatsDocument::Mapping(counters));
    }

    let states: &[&str] = if version.at_least(CONTAINER_STATES_MIN_API_VERSION) {
        &CONTAINER_STATE_KEYS
    } else {
        &[]
    };

    for key in HOST_TOTAL_KEYS.iter().chain(states) {
        match info.get(*key) {
            Some(StatsDocument::Scalar(value)) if value.is_numeric() => {
                counters.insert((*key).to_owned(), StatsDocument::Scalar(value.clone()));
            }
            Some(other) => {
                return Err(SchemaError::NotANumber {
                    path: (*key).to_owned(),
                    found: other.kind(),
                });
            }
            None => {}
        }
    }

    Ok(StatsDocument::Mapping(counters))
}

fn into_mapping(doc: StatsDocument, path: &str) -> Result<Mapping, SchemaError> {
    match doc {
        StatsDocument::Mapping(map) => Ok(map),
        other => Err(SchemaError::NotAMapping {
            path: path.to_owned(),
            found: other.kind(),
        }),
    }
}

fn normalize_blkio(blkio: StatsDocument) -> Result<StatsDocument, SchemaError> {
    let categories = into_mapping(blkio, BLKIO_KEY)?;
    let mut out = Mapping::new();

    for (category, value) in categories {
        let path = format!("{BLKIO_KEY}.{category}");
        let normalized = match value {
            StatsDocument::Sequence(records) => fold_blkio_records(&path, &records)?,
            // Already keyed by operation.
            StatsDocument::Mapping(map) => StatsDocument::Mapping(map),
            other => {
                return Err(SchemaError::NotASequence {
                    path,
                    found: other.kind(),
                });
            }
        };
        out.insert(category, normalized);
    }

    Ok(StatsDocument::Mapping(out))
}

fn fold_blkio_records(path: &str, records: &[StatsDocument]) -> Result<StatsDocument, SchemaError> {
    let mut ops = Mapping::new();

    for (index, record) in records.iter().enumerate() {
        if record.as_mapping().is_none() {
            return Err(SchemaError::NotAMapping {
                path: format!("{path}.{index}"),
                found: record.kind(),
            });
        }

        let op = match record.get("op") {
            Some(StatsDocument::Scalar(Scalar::Str(op))) => op.to_lowercase(),
            _ => {
                return Err(SchemaError::MissingField {
                    path: path.to_owned(),
                    index,
                    field: "op",
                });
            }
        };

        let value = match record.get("value") {
            Some(StatsDocument::Scalar(value)) if value.is_numeric() => value,
            Some(other) => {
                return Err(SchemaError::NotANumber {
                    path: format!("{path}.{index}.value"),
                    found: other.kind(),
                });
            }
            None => {
                return Err(SchemaError::MissingField {
                    path: path.to_owned(),
                    index,
                    field: "value",
                });
            }
        };

        accumulate(&mut ops, op, value, path)?;
    }

    Ok(StatsDocument::Mapping(ops))
}

fn aggregate_networks(networks: &StatsDocument) -> Result<StatsDocument, SchemaError> {
    let interfaces = networks
        .as_mapping()
        .ok_or_else(|| SchemaError::NotAMapping {
            path: NETWORKS_KEY.to_owned(),
            found: networks.kind(),
        })?;

    let mut total = Mapping::new();
    for (iface, counters) in interfaces {
        let path = format!("{NETWORKS_KEY}.{iface}");
        let counters = counters
            .as_mapping()
            .ok_or_else(|| SchemaError::NotAMapping {
                path: path.clone(),
                found: counters.kind(),
            })?;

        for (name, value) in counters {
            match value {
                StatsDocument::Scalar(v) if v.is_numeric() => {
                    accumulate(&mut total, name.clone(), v, &path)?;
                }
                other => {
                    return Err(SchemaError::NotANumber {
                        path: format!("{path}.{name}"),
                        found: other.kind(),
                    });
                }
            }
        }
    }

    Ok(StatsDocument::Mapping(total))
}

fn accumulate(
    into: &mut Mapping,
    key: String,
    value: &Scalar,
    path: &str,
) -> Result<(), SchemaError> {
    match into.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(StatsDocument::Scalar(value.clone()));
        }
        Entry::Occupied(mut entry) => {
            let sum = match entry.get() {
                StatsDocument::Scalar(current) => current.checked_add(value),
                _ => None,
            };
            let sum = sum.ok_or_else(|| SchemaError::NotANumber {
                path: format!("{path}.{}", entry.key()),
                found: entry.get().kind(),
            })?;
            entry.insert(StatsDocument::Scalar(sum));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> StatsDocument {
        StatsDocument::from(value)
    }

    #[test]
    fn test_blkio_records_become_op_mapping() {
        let stats = doc(json!({
            "blkio_stats": {
                "io_service_bytes_recursive": [
                    {"major": 8, "minor": 0, "op": "Read", "value": 100},
                    {"major": 8, "minor": 0, "op": "Write", "value": 200},
                    {"major": 8, "minor": 0, "op": "Sync", "value": 50},
                    {"major": 8, "minor": 0, "op": "Async", "value": 250},
                    {"major": 8, "minor": 0, "op": "Total", "value": 300}
                ]
            }
        }));
        let out = normalize_container_stats(stats, &ApiVersion::new("1.41")).unwrap();
        assert_eq!(
            out,
            doc(json!({
                "blkio_stats": {
                    "io_service_bytes_recursive": {
                        "read": 100, "write": 200, "sync": 50, "async": 250, "total": 300
                    }
                }
            }))
        );
    }

    #[test]
    fn test_blkio_sums_devices() {
        let stats = doc(json!({
            "blkio_stats": {
                "io_serviced_recursive": [
                    {"major": 8, "minor": 0, "op": "Read", "value": 1},
                    {"major": 8, "minor": 16, "op": "Read", "value": 2}
                ]
            }
        }));
        let out = normalize_container_stats(stats, &ApiVersion::new("1.41")).unwrap();
        assert_eq!(
            out,
            doc(json!({"blkio_stats": {"io_serviced_recursive": {"read": 3}}}))
        );
    }

    #[test]
    fn test_blkio_null_and_empty_categories() {
        let stats = doc(json!({
            "blkio_stats": {
                "io_queue_recursive": null,
                "io_merged_recursive": []
            }
        }));
        let out = normalize_container_stats(stats, &ApiVersion::new("1.41")).unwrap();
        assert_eq!(out.leaf_count(), 0);
    }

    #[test]
    fn test_blkio_record_without_op() {
        let stats = doc(json!({
            "blkio_stats": {"io_serviced_recursive": [{"value": 1}]}
        }));
        let err = normalize_container_stats(stats, &ApiVersion::new("1.41")).unwrap_err();
        match err {
            SchemaError::MissingField { path, index, field } => {
                assert_eq!(path, "blkio_stats.io_serviced_recursive");
                assert_eq!(index, 0);
                assert_eq!(field, "op");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blkio_scalar_category() {
        let stats = doc(json!({"blkio_stats": {"io_serviced_recursive": 5}}));
        let err = normalize_container_stats(stats, &ApiVersion::new("1.41")).unwrap_err();
        assert!(matches!(err, SchemaError::NotASequence { .. }));
    }

    #[test]
    fn test_networks_are_summed_across_interfaces() {
        let stats = doc(json!({
            "networks": {
                "eth0": {"rx_bytes": 10, "tx_bytes": 1},
                "eth1": {"rx_bytes": 5, "tx_bytes": 2}
            }
        }));
        let out = normalize_container_stats(stats, &ApiVersion::new("1.21")).unwrap();
        assert_eq!(
            out,
            doc(json!({"network": {"rx_bytes": 15, "tx_bytes": 3}}))
        );
        assert!(out.get("networks").is_none());
    }

    #[test]
    fn test_networks_untouched_below_threshold() {
        let stats = doc(json!({
            "network": {"rx_bytes": 7},
            "networks": {"eth0": {"rx_bytes": 10}}
        }));
        let out = normalize_container_stats(stats.clone(), &ApiVersion::new("1.20")).unwrap();
        assert_eq!(out, stats);
    }

    #[test]
    fn test_networks_interface_not_a_mapping() {
        let stats = doc(json!({"networks": {"eth0": 3}}));
        let err = normalize_container_stats(stats, &ApiVersion::new("1.41")).unwrap_err();
        match err {
            SchemaError::NotAMapping { path, found } => {
                assert_eq!(path, "networks.eth0");
                assert_eq!(found, "number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_document_must_be_a_mapping() {
        let err = normalize_container_stats(doc(json!([1, 2])), &ApiVersion::new("1.41"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotAMapping { found: "sequence", .. }));
    }

    #[test]
    fn test_host_counters_gating() {
        let info = doc(json!({
            "Containers": 4,
            "Images": 9,
            "ContainersRunning": 1,
            "ContainersPaused": 0,
            "ContainersStopped": 3,
            "Name": "docker-host"
        }));

        let old = host_counters(&info, &ApiVersion::new("1.20")).unwrap();
        assert_eq!(old.leaf_count(), 0);

        let totals = host_counters(&info, &ApiVersion::new("1.21")).unwrap();
        assert_eq!(totals, doc(json!({"Containers": 4, "Images": 9})));

        let full = host_counters(&info, &ApiVersion::new("1.41")).unwrap();
        assert_eq!(
            full,
            doc(json!({
                "Containers": 4,
                "Images": 9,
                "ContainersRunning": 1,
                "ContainersPaused": 0,
                "ContainersStopped": 3
            }))
        );
    }

    #[test]
    fn test_host_counter_not_numeric() {
        let info = doc(json!({"Images": "many"}));
        let err = host_counters(&info, &ApiVersion::new("1.41")).unwrap_err();
        assert!(matches!(err, SchemaError::NotANumber { found: "string", .. }));
    }
}
