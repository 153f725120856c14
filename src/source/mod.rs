//! Access to the container runtime's statistics API.
//!
//! The poll loop only sees the [`StatsSource`] trait. [`DockerSource`] is the
//! production implementation, speaking HTTP/1.1 to the Docker Engine API over
//! a unix-domain socket or TCP.

mod connector;
mod docker;
mod error;

pub use connector::{Connector, Endpoint, Stream};
pub use docker::DockerSource;
pub use error::{DecodeError, Error, Result, TransportError};

use crate::container::ContainerID;
use crate::stats::{ApiVersion, StatsDocument};

pub trait StatsSource {
    /// API version reported by the source, e.g. `"1.41"`.
    fn api_version(&self) -> impl Future<Output = Result<ApiVersion>>;

    /// Identifiers of all live containers.
    fn list_containers(&self) -> impl Future<Output = Result<Vec<ContainerID>>>;

    /// One raw statistics sample for a container.
    fn container_stats(&self, id: &ContainerID) -> impl Future<Output = Result<StatsDocument>>;

    /// The daemon-wide info document.
    fn global_info(&self) -> impl Future<Output = Result<StatsDocument>>;
}
