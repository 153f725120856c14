//! Docker Librato: a collectd exec plugin that publishes Docker container and
//! host statistics.
//!
//! Every poll cycle asks the Docker Engine API for the running containers,
//! reads one stats sample per container, normalizes it across API versions,
//! flattens it into dotted metric paths, filters and renames those paths, and
//! writes one `PUTVAL` line per metric to standard output for collectd to pick
//! up.

use std::io;

pub mod config;
pub mod container;
pub mod error;
pub mod output;
pub mod poller;
pub mod source;
pub mod stats;

use config::Config;
use error::Error;
use output::LineEmitter;
use poller::Poller;
use source::DockerSource;

/// Runs the poll loop until it is interrupted or a cycle fails.
///
/// # Errors
///
/// Returns [`Error::Interrupted`] after SIGINT or SIGTERM, otherwise the error
/// that aborted the running cycle.
pub async fn run(config: Config) -> Result<(), Error> {
    log::debug!(
        "polling {} every {}s as {}",
        config.endpoint,
        config.interval,
        config.hostname
    );

    let source = DockerSource::new(config.endpoint, config.timeout)
        .with_streamed_stats(config.stream_stats);
    let emitter = LineEmitter::new(config.hostname, config.interval, io::stdout());
    Poller::new(source, config.filter, emitter, config.interval)
        .run(shutdown_signal())
        .await
}

/// Resolves on SIGINT or SIGTERM. A signal that cannot be listened for is
/// logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for SIGINT: {err}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                log::warn!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => log::info!("received SIGINT"),
        _ = terminate => log::info!("received SIGTERM"),
    }
}
