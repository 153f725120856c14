//! Include/exclude policy over flattened metric paths.
//!
//! Rules are written in a small glob vocabulary and translated to anchored
//! regular expressions:
//!
//! - `\w+` and `\d+` are kept as regex classes (id and index segments),
//! - `*` matches the rest of the path (any characters, including dots),
//! - every other character is literal, so `.` only matches a dot.
//!
//! A rule must match the entire path. Exclude rules are checked first and
//! always win; a path that survives them is kept only if some include rule
//! matches.

use regex::Regex;

/// Metric families published by default.
pub const DEFAULT_INCLUDE_RULES: [&str; 6] = [
    r"docker-librato.\w+.cpu_stats.*",
    r"docker-librato.\w+.memory_stats.*",
    r"docker-librato.\w+.network.*",
    r"docker-librato.\w+.blkio_stats.io_service_bytes_recursive.*",
    r"docker-librato.\w+.blkio_stats.io_serviced_recursive.*",
    r"docker-librato.host.*",
];

/// Metrics that are dropped even if an include rule matches.
pub const DEFAULT_EXCLUDE_RULES: [&str; 2] = [
    r"docker-librato.\w+.memory_stats.stats.total_*",
    r"docker-librato.\w+.cpu_stats.cpu_usage.percpu_usage.*",
];

#[derive(Debug, thiserror::Error)]
#[error("invalid metric rule `{pattern}`: {source}")]
pub struct RuleError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A compiled, fully anchored filter rule.
#[derive(Debug, Clone)]
pub struct FilterRule {
    pattern: String,
    regex: Regex,
}

impl FilterRule {
    /// Compiles a rule written in the glob vocabulary described in the module docs.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] if the translated expression does not compile.
    pub fn new(pattern: impl Into<String>) -> Result<Self, RuleError> {
        let pattern = pattern.into();
        match Regex::new(&glob_to_regex(&pattern)) {
            Ok(regex) => Ok(Self { pattern, regex }),
            Err(source) => Err(RuleError { pattern, source }),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns `true` if the rule matches the whole `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Translates a glob rule into an anchored regular expression.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 6);
    out.push_str("^(?:");

    let mut rest = pattern;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix(r"\w+").or_else(|| rest.strip_prefix(r"\d+")) {
            out.push_str(&rest[..3]);
            rest = tail;
        } else if c == '*' {
            out.push_str(".*");
            rest = &rest[1..];
        } else {
            let mut buf = [0u8; 4];
            out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            rest = &rest[c.len_utf8()..];
        }
    }

    out.push_str(")$");
    out
}

/// Ordered exclude-then-include policy.
#[derive(Debug, Clone)]
pub struct MetricFilter {
    exclude: Vec<FilterRule>,
    include: Vec<FilterRule>,
}

impl MetricFilter {
    /// Compiles the given rule sets.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleError`] encountered.
    pub fn new<I, E>(include: I, exclude: E) -> Result<Self, RuleError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Ok(Self {
            exclude: exclude
                .into_iter()
                .map(FilterRule::new)
                .collect::<Result<_, _>>()?,
            include: include
                .into_iter()
                .map(FilterRule::new)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Compiles [`DEFAULT_INCLUDE_RULES`] and [`DEFAULT_EXCLUDE_RULES`].
    pub fn with_defaults() -> Result<Self, RuleError> {
        Self::new(DEFAULT_INCLUDE_RULES, DEFAULT_EXCLUDE_RULES)
    }

    /// Decides whether a flattened path is published.
    pub fn accepts(&self, path: &str) -> bool {
        if let Some(rule) = self.exclude.iter().find(|rule| rule.matches(path)) {
            log::trace!("`{path}` excluded by `{}`", rule.pattern());
            return false;
        }
        self.include.iter().any(|rule| rule.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> MetricFilter {
        MetricFilter::with_defaults().unwrap()
    }

    #[test]
    fn test_glob_translation() {
        assert_eq!(glob_to_regex(r"a.\d+"), r"^(?:a\.\d+)$");
        assert_eq!(glob_to_regex(r"a_\w+_*"), r"^(?:a_\w+_.*)$");
    }

    #[test]
    fn test_rule_is_anchored() {
        let rule = FilterRule::new("docker-librato.host.Images").unwrap();
        assert!(rule.matches("docker-librato.host.Images"));
        assert!(!rule.matches("docker-librato.host.Images.extra"));
        assert!(!rule.matches("x.docker-librato.host.Images"));
    }

    #[test]
    fn test_dot_is_literal() {
        let rule = FilterRule::new(r"docker-librato.\w+.network.*").unwrap();
        assert!(!rule.matches("docker-librato.abcdef012345Xnetwork.rx_bytes"));
        assert!(rule.matches("docker-librato.abcdef012345.network.rx_bytes"));
    }

    #[test]
    fn test_default_includes() {
        let filter = defaults();
        for path in [
            "docker-librato.abcdef012345.cpu_stats.cpu_usage.total_usage",
            "docker-librato.abcdef012345.memory_stats.stats.cache",
            "docker-librato.abcdef012345.network.rx_bytes",
            "docker-librato.abcdef012345.blkio_stats.io_service_bytes_recursive.read",
            "docker-librato.abcdef012345.blkio_stats.io_serviced_recursive.total",
            "docker-librato.host.ContainersRunning",
        ] {
            assert!(filter.accepts(path), "{path} should be accepted");
        }
    }

    #[test]
    fn test_unmatched_path_is_discarded() {
        let filter = defaults();
        assert!(!filter.accepts("docker-librato.abcdef012345.read"));
        assert!(!filter.accepts("docker-librato.abcdef012345.blkio_stats.io_queue_recursive.read"));
        assert!(!filter.accepts("docker-librato.abcdef012345.networks.eth0.rx_bytes"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = defaults();
        assert!(!filter.accepts("docker-librato.abcdef012345.memory_stats.stats.total_cache"));
        assert!(!filter.accepts("docker-librato.abcdef012345.cpu_stats.cpu_usage.percpu_usage.0"));

        let filter = MetricFilter::new([r"a.*"], [r"a.b"]).unwrap();
        assert!(!filter.accepts("a.b"));
        assert!(filter.accepts("a.c"));
    }

    #[test]
    fn test_empty_include_set_discards_everything() {
        let filter = MetricFilter::new(Vec::<String>::new(), Vec::<String>::new()).unwrap();
        assert!(!filter.accepts("docker-librato.abcdef012345.cpu_stats.x"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let rule = FilterRule::new(r"a(b)+c?").unwrap();
        assert!(rule.matches("a(b)+c?"));
        assert!(!rule.matches("abc"));
        assert_eq!(rule.pattern(), r"a(b)+c?");
    }
}
