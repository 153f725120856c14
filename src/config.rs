//! Start-up configuration.
//!
//! Values are read once from the environment (the collectd exec plugin sets
//! `COLLECTD_HOSTNAME` and `COLLECTD_INTERVAL`) and handed to [`crate::run`]
//! as a plain [`Config`].

use std::fmt;
use std::time::Duration;

use crate::source::{Endpoint, TransportError};
use crate::stats::{DEFAULT_EXCLUDE_RULES, DEFAULT_INCLUDE_RULES, MetricFilter, RuleError};

pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_INTERVAL_SECS: f64 = 60.0;
pub const DEFAULT_BASE_URI: &str = "unix://var/run/docker.sock";
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

const HOSTNAME_VAR: &str = "COLLECTD_HOSTNAME";
const INTERVAL_VAR: &str = "COLLECTD_INTERVAL";
const BASE_URI_VAR: &str = "BASE_URI";
const TIMEOUT_VAR: &str = "DEFAULT_SOCKET_TIMEOUT";
const DEBUG_VAR: &str = "DEBUG";
const STREAM_VAR: &str = "STATS_STREAM";
const INCLUDE_VAR: &str = "INCLUDE_METRICS";
const EXCLUDE_VAR: &str = "EXCLUDE_METRICS";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{var}`: expected a positive number of seconds")]
    InvalidSeconds { var: &'static str, value: String },
    #[error("invalid value `{value}` for `{var}`: expected a boolean")]
    InvalidFlag { var: &'static str, value: String },
    #[error(transparent)]
    Endpoint(#[from] TransportError),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Poll interval, as reported on every output line and slept between cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    secs: f64,
    duration: Duration,
}

impl Interval {
    /// Returns `None` unless `secs` is positive and fits in a [`Duration`].
    pub fn from_secs(secs: f64) -> Option<Self> {
        positive_duration(secs).map(|duration| Self { secs, duration })
    }

    pub fn as_duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.secs)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub hostname: String,
    pub interval: Interval,
    pub endpoint: Endpoint,
    pub timeout: Duration,
    pub debug: bool,
    pub stream_stats: bool,
    pub filter: MetricFilter,
}

impl Config {
    /// Reads the configuration from the process environment. The base address
    /// falls back to the first command line argument when `BASE_URI` is unset.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok(), std::env::args().nth(1))
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] for a non-positive or non-numeric interval or
    /// timeout, an unrecognised boolean, an unsupported base address, or a
    /// filter rule that does not compile.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        base_uri_arg: Option<String>,
    ) -> Result<Self> {
        let hostname = lookup(HOSTNAME_VAR)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOSTNAME.to_owned());

        let interval = parse_seconds(
            INTERVAL_VAR,
            lookup(INTERVAL_VAR),
            DEFAULT_INTERVAL_SECS,
            Interval::from_secs,
        )?;
        let timeout = parse_seconds(
            TIMEOUT_VAR,
            lookup(TIMEOUT_VAR),
            DEFAULT_TIMEOUT_SECS,
            positive_duration,
        )?;

        let base_uri = lookup(BASE_URI_VAR)
            .or(base_uri_arg)
            .unwrap_or_else(|| DEFAULT_BASE_URI.to_owned());
        let endpoint = Endpoint::parse(&base_uri)?;

        let debug = lookup(DEBUG_VAR).is_some_and(|v| !v.is_empty());
        let stream_stats = parse_flag(STREAM_VAR, lookup(STREAM_VAR))?;

        let include = rule_list(lookup(INCLUDE_VAR), &DEFAULT_INCLUDE_RULES);
        let exclude = rule_list(lookup(EXCLUDE_VAR), &DEFAULT_EXCLUDE_RULES);
        let filter = MetricFilter::new(include, exclude)?;

        Ok(Self {
            hostname,
            interval,
            endpoint,
            timeout,
            debug,
            stream_stats,
            filter,
        })
    }
}

/// Parses a number of seconds, or `default` when unset, and converts it.
/// A value `convert` rejects is an [`Error::InvalidSeconds`].
fn parse_seconds<T>(
    var: &'static str,
    value: Option<String>,
    default: f64,
    convert: impl Fn(f64) -> Option<T>,
) -> Result<T> {
    let value = value.unwrap_or_else(|| default.to_string());
    let secs = value.trim().parse::<f64>().ok();
    secs.and_then(convert).ok_or_else(|| Error::InvalidSeconds { var, value })
}

/// Non-zero durations only; NaN, negative and out-of-range values are `None`.
fn positive_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|duration| !duration.is_zero())
}

fn parse_flag(var: &'static str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidFlag { var, value }),
    }
}

/// Splits a comma-separated rule list, or falls back to `defaults`.
fn rule_list(value: Option<String>, defaults: &[&str]) -> Vec<String> {
    match value {
        Some(value) => value
            .split(',')
            .map(str::trim)
            .filter(|rule| !rule.is_empty())
            .map(str::to_owned)
            .collect(),
        None => defaults.iter().map(|rule| (*rule).to_owned()).collect(),
    }
}
