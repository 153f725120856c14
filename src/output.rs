//! Collectd exec-plugin output.
//!
//! Each accepted metric becomes one line:
//!
//! ```text
//! PUTVAL "<hostname>/<metric name with dots replaced by slashes>" interval=<seconds> N:<value>
//! ```

use std::io::Write;

use crate::config::Interval;
use crate::stats::{NamedMetric, Scalar};

/// Formats a single `PUTVAL` line, without the trailing newline.
///
/// # Examples
///
/// ```
/// # use docker_librato::config::Interval;
/// # use docker_librato::output::format_line;
/// # use docker_librato::stats::Scalar;
/// let line = format_line(
///     "localhost",
///     "docker-librato-abcdef012345.cpu-total",
///     Interval::from_secs(60.0).unwrap(),
///     &Scalar::UInt(42),
/// );
/// assert_eq!(
///     line,
///     r#"PUTVAL "localhost/docker-librato-abcdef012345/cpu-total" interval=60 N:42"#
/// );
/// ```
pub fn format_line(hostname: &str, metric: &str, interval: Interval, value: &Scalar) -> String {
    format!(
        "PUTVAL \"{hostname}/{}\" interval={interval} N:{value}",
        metric.replace('.', "/")
    )
}

/// Writes `PUTVAL` lines for one host to an output stream.
#[derive(Debug)]
pub struct LineEmitter<W> {
    hostname: String,
    interval: Interval,
    out: W,
}

impl<W: Write> LineEmitter<W> {
    pub fn new(hostname: impl Into<String>, interval: Interval, out: W) -> Self {
        Self {
            hostname: hostname.into(),
            interval,
            out,
        }
    }

    /// Writes one line per metric and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if writing or flushing fails.
    pub fn emit_all(&mut self, metrics: &[NamedMetric]) -> std::io::Result<()> {
        for metric in metrics {
            self.emit(&metric.name, &metric.value)?;
        }
        self.out.flush()
    }

    /// Writes a single line.
    pub fn emit(&mut self, metric: &str, value: &Scalar) -> std::io::Result<()> {
        writeln!(
            self.out,
            "{}",
            format_line(&self.hostname, metric, self.interval, value)
        )
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_replaces_dots() {
        let line = format_line(
            "web-01",
            "docker-librato-abcdef012345.memory_stats.failcnt",
            Interval::from_secs(10.0).unwrap(),
            &Scalar::UInt(0),
        );
        assert_eq!(
            line,
            r#"PUTVAL "web-01/docker-librato-abcdef012345/memory_stats/failcnt" interval=10 N:0"#
        );
    }

    #[test]
    fn test_format_line_fractional_interval_and_float() {
        let line = format_line(
            "localhost",
            "a.b",
            Interval::from_secs(2.5).unwrap(),
            &Scalar::Float(0.75),
        );
        assert_eq!(line, r#"PUTVAL "localhost/a/b" interval=2.5 N:0.75"#);
    }

    #[test]
    fn test_emit_all_writes_one_line_per_metric() {
        let mut emitter =
            LineEmitter::new("localhost", Interval::from_secs(60.0).unwrap(), Vec::new());
        emitter
            .emit_all(&[
                NamedMetric {
                    name: "docker-librato-abc.cpu-total".into(),
                    value: Scalar::UInt(1),
                },
                NamedMetric {
                    name: "docker-librato-abc.cpu-user".into(),
                    value: Scalar::UInt(2),
                },
            ])
            .unwrap();
        let out = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(
            out,
            "PUTVAL \"localhost/docker-librato-abc/cpu-total\" interval=60 N:1\n\
             PUTVAL \"localhost/docker-librato-abc/cpu-user\" interval=60 N:2\n"
        );
    }
}
