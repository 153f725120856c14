//! The poll loop.
//!
//! One cycle runs `version -> list containers -> host counters -> per container
//! (collect, normalize, flatten, filter, translate, emit)`, strictly one
//! container after the other. Cycles are separated by the configured interval.
//!
//! Failures while reading the API version, the daemon info or the container
//! list end the loop. A container whose stats cannot be fetched, decoded or
//! normalized is logged and skipped; the rest of the cycle continues.
//!
//! Shutdown is checked before every cycle and while sleeping between cycles.
//! A cycle that is already running finishes first; its requests are bounded
//! by the source's timeout.

use std::io::Write;

use crate::config::Interval;
use crate::container::ContainerID;
use crate::error::{Error, Result};
use crate::output::LineEmitter;
use crate::source::StatsSource;
use crate::stats::{
    self, ApiVersion, HOST_COUNTERS_MIN_API_VERSION, HOST_SEGMENT, MetricFilter, StatsDocument,
};

/// Summary of one poll cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Containers listed by the source.
    pub containers: usize,
    /// Containers skipped after a per-container failure.
    pub skipped: usize,
    /// Lines written, host counters included.
    pub metrics: usize,
}

pub struct Poller<S, W> {
    source: S,
    filter: MetricFilter,
    emitter: LineEmitter<W>,
    interval: Interval,
}

impl<S, W> Poller<S, W>
where
    S: StatsSource,
    W: Write,
{
    pub fn new(
        source: S,
        filter: MetricFilter,
        emitter: LineEmitter<W>,
        interval: Interval,
    ) -> Self {
        Self {
            source,
            filter,
            emitter,
            interval,
        }
    }

    pub fn emitter(&self) -> &LineEmitter<W> {
        &self.emitter
    }

    /// Polls until `shutdown` resolves or a cycle fails.
    ///
    /// # Errors
    ///
    /// Always ends with an error: [`Error::Interrupted`] once `shutdown`
    /// resolves, otherwise the error that aborted the cycle.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => return Err(Error::Interrupted),
                _ = std::future::ready(()) => {}
            }

            let report = self.run_cycle().await?;
            log::debug!(
                "cycle done: containers={}, skipped={}, metrics={}",
                report.containers,
                report.skipped,
                report.metrics
            );

            tokio::select! {
                _ = &mut shutdown => return Err(Error::Interrupted),
                _ = tokio::time::sleep(self.interval.as_duration()) => {}
            }
        }
    }

    /// Runs a single poll cycle.
    ///
    /// # Errors
    ///
    /// Returns the error of the version, container list or daemon info
    /// request, a schema error in the daemon info, or a write error.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let version = self.source.api_version().await?;
        log::debug!("stats source API version {version}");

        let containers = self.source.list_containers().await?;
        log::debug!("found {} containers", containers.len());

        let mut report = CycleReport {
            containers: containers.len(),
            ..CycleReport::default()
        };

        if version.at_least(HOST_COUNTERS_MIN_API_VERSION) {
            let info = self.source.global_info().await?;
            let counters = stats::host_counters(&info, &version)?;
            report.metrics += self.publish(&counters, HOST_SEGMENT)?;
        }

        for id in &containers {
            match self.collect(id, &version).await {
                Ok(doc) => report.metrics += self.publish(&doc, id.short())?,
                Err(err) => {
                    log::error!(
                        target: "poller",
                        "skipping container: container_id={}, error={}",
                        id,
                        err
                    );
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    async fn collect(&self, id: &ContainerID, version: &ApiVersion) -> Result<StatsDocument> {
        log::trace!("collecting stats for {id}");
        let raw = self.source.container_stats(id).await?;
        Ok(stats::normalize_container_stats(raw, version)?)
    }

    fn publish(&mut self, doc: &StatsDocument, segment: &str) -> Result<usize> {
        let metrics = stats::prepare(doc, segment, &self.filter);
        self.emitter.emit_all(&metrics).map_err(Error::Output)?;
        Ok(metrics.len())
    }
}
