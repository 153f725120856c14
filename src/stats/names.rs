//! Translation of flattened paths into canonical metric names.
//!
//! A path `docker-librato.<segment>.<suffix...>` is split into the prefix
//! `docker-librato-<segment>` and the relative suffix. The suffix is looked up
//! in [`METRIC_NAMES`]; a declared name replaces it, anything else (unknown
//! suffix, or an entry without a name) is kept as is. Translation never fails.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Canonical names keyed by relative metric suffix. `None` marks a known
/// metric that keeps its suffix.
#[rustfmt::skip]
const METRIC_TABLE: &[(&str, Option<&str>)] = &[
    // CPU time, nanoseconds.
    ("cpu_stats.cpu_usage.total_usage", Some("cpu-total")),
    ("cpu_stats.cpu_usage.usage_in_kernelmode", Some("cpu-kernel")),
    ("cpu_stats.cpu_usage.usage_in_usermode", Some("cpu-user")),
    ("cpu_stats.system_cpu_usage", None),
    ("cpu_stats.throttling_data.periods", Some("cpu-periods")),
    ("cpu_stats.throttling_data.throttled_periods", Some("cpu-throttled_periods")),
    ("cpu_stats.throttling_data.throttled_time", Some("cpu-throttled_time")),

    ("network.rx_bytes", Some("network-rx_bytes")),
    ("network.rx_dropped", Some("network-rx_dropped")),
    ("network.rx_errors", Some("network-rx_errors")),
    ("network.rx_packets", Some("network-rx_packets")),
    ("network.tx_bytes", Some("network-tx_bytes")),
    ("network.tx_dropped", Some("network-tx_dropped")),
    ("network.tx_errors", Some("network-tx_errors")),
    ("network.tx_packets", Some("network-tx_packets")),

    // Memory, bytes unless noted.
    ("memory_stats.usage", Some("memory-usage")),
    ("memory_stats.limit", Some("memory-limit")),
    ("memory_stats.max_usage", Some("memory-max_usage")),
    ("memory_stats.failcnt", None),
    ("memory_stats.stats.active_anon", Some("memory-active_anon")),
    ("memory_stats.stats.active_file", Some("memory-active_file")),
    ("memory_stats.stats.cache", Some("memory-cache")),
    ("memory_stats.stats.hierarchical_memory_limit", Some("memory-hierarchical_limit")),
    ("memory_stats.stats.inactive_anon", Some("memory-inactive_anon")),
    ("memory_stats.stats.inactive_file", Some("memory-inactive_file")),
    ("memory_stats.stats.mapped_file", Some("memory-mapped_file")),
    ("memory_stats.stats.pgfault", Some("memory-page_faults")),
    ("memory_stats.stats.pgmajfault", Some("memory-page_major_faults")),
    ("memory_stats.stats.pgpgin", Some("memory-paged_in")),
    ("memory_stats.stats.pgpgout", Some("memory-paged_out")),
    ("memory_stats.stats.rss", Some("memory-rss")),
    ("memory_stats.stats.rss_huge", Some("memory-rss_huge")),

    // Block I/O bytes.
    ("blkio_stats.io_service_bytes_recursive.read", Some("blkio-read_bytes")),
    ("blkio_stats.io_service_bytes_recursive.write", Some("blkio-write_bytes")),
    ("blkio_stats.io_service_bytes_recursive.sync", Some("blkio-sync_bytes")),
    ("blkio_stats.io_service_bytes_recursive.async", Some("blkio-async_bytes")),
    ("blkio_stats.io_service_bytes_recursive.total", Some("blkio-total_bytes")),
    // Block I/O operation counts.
    ("blkio_stats.io_serviced_recursive.read", Some("blkio-read_ops")),
    ("blkio_stats.io_serviced_recursive.write", Some("blkio-write_ops")),
    ("blkio_stats.io_serviced_recursive.sync", Some("blkio-sync_ops")),
    ("blkio_stats.io_serviced_recursive.async", Some("blkio-async_ops")),
    ("blkio_stats.io_serviced_recursive.total", Some("blkio-total_ops")),

    // Host counters.
    ("Images", Some("images")),
    ("Containers", Some("containers-total")),
    ("ContainersRunning", Some("containers-running")),
    ("ContainersPaused", Some("containers-paused")),
    ("ContainersStopped", Some("containers-stopped")),
];

pub static METRIC_NAMES: LazyLock<HashMap<&'static str, Option<&'static str>>> =
    LazyLock::new(|| METRIC_TABLE.iter().copied().collect());

/// Returns the canonical name for a relative suffix, or the suffix itself.
pub fn canonical_name(suffix: &str) -> &str {
    match METRIC_NAMES.get(suffix) {
        Some(Some(name)) => *name,
        _ => suffix,
    }
}

/// Translates a flattened path into `<namespace>-<segment>.<name>`.
///
/// # Examples
///
/// ```
/// # use docker_librato::stats::translate;
/// assert_eq!(
///     translate("docker-librato.abcdef012345.cpu_stats.cpu_usage.total_usage"),
///     "docker-librato-abcdef012345.cpu-total",
/// );
/// assert_eq!(
///     translate("docker-librato.abcdef012345.cpu_stats.unknown"),
///     "docker-librato-abcdef012345.cpu_stats.unknown",
/// );
/// ```
pub fn translate(path: &str) -> String {
    let mut parts = path.splitn(3, '.');
    let prefix = match (parts.next(), parts.next()) {
        (Some(namespace), Some(segment)) => format!("{namespace}-{segment}"),
        (Some(namespace), None) => namespace.to_owned(),
        _ => return path.to_owned(),
    };

    match parts.next() {
        Some(suffix) if !suffix.is_empty() => format!("{prefix}.{}", canonical_name(suffix)),
        _ => prefix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_mapped_name() {
        assert_eq!(
            translate("docker-librato.abcdef012345.memory_stats.stats.pgfault"),
            "docker-librato-abcdef012345.memory-page_faults"
        );
        assert_eq!(
            translate("docker-librato.host.ContainersRunning"),
            "docker-librato-host.containers-running"
        );
    }

    #[test]
    fn test_translate_entry_without_name() {
        assert_eq!(
            translate("docker-librato.abcdef012345.memory_stats.failcnt"),
            "docker-librato-abcdef012345.memory_stats.failcnt"
        );
    }

    #[test]
    fn test_translate_unmapped_passes_through() {
        assert_eq!(
            translate("docker-librato.abcdef012345.network.collisions"),
            "docker-librato-abcdef012345.network.collisions"
        );
    }

    #[test]
    fn test_translate_short_paths() {
        assert_eq!(translate("docker-librato.abc"), "docker-librato-abc");
        assert_eq!(translate("docker-librato"), "docker-librato");
        assert_eq!(translate(""), "");
    }

    #[test]
    fn test_translation_is_never_empty_for_suffixes() {
        for (suffix, _) in METRIC_TABLE {
            assert!(!canonical_name(suffix).is_empty());
        }
        for suffix in ["x", "a.b.c", "memory_stats.stats.total_rss"] {
            assert_eq!(canonical_name(suffix), suffix);
        }
    }

    #[test]
    fn test_table_has_unique_suffixes_and_names() {
        assert_eq!(METRIC_NAMES.len(), METRIC_TABLE.len());
        let mut reverse = HashMap::new();
        for (suffix, name) in METRIC_TABLE {
            if let Some(name) = name {
                assert!(reverse.insert(*name, *suffix).is_none(), "duplicate name {name}");
            }
        }
    }

    #[test]
    fn test_reverse_lookup_recovers_suffix() {
        let reverse: HashMap<&str, &str> = METRIC_TABLE
            .iter()
            .filter_map(|(suffix, name)| name.map(|name| (name, *suffix)))
            .collect();
        for (suffix, name) in METRIC_TABLE {
            if name.is_some() {
                assert_eq!(reverse[canonical_name(suffix)], *suffix);
            }
        }
    }
}
