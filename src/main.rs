use std::process::ExitCode;

use docker_librato::config::Config;

/// Entry point for the Docker Librato collectd exec plugin.
///
/// Configuration comes from the environment; see [`Config::from_env`].
/// Metrics are written to stdout, diagnostics to stderr.
///
/// # Examples
///
/// ```bash
/// COLLECTD_HOSTNAME=web-01 COLLECTD_INTERVAL=10 docker-librato unix:///var/run/docker.sock
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            init_logging(std::env::var_os("DEBUG").is_some_and(|v| !v.is_empty()));
            let err = docker_librato::error::Error::from(err);
            log::error!("{err}");
            return err.exit_code();
        }
    };
    init_logging(config.debug);

    match docker_librato::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.is_failure() {
                log::error!("{err}");
            } else {
                log::info!("{err}");
            }
            err.exit_code()
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
