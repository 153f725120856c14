use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::{Method, Request, header};
use serde::de::DeserializeOwned;
use tower::ServiceExt;

use super::{Connector, DecodeError, Endpoint, Result, StatsSource, TransportError};
use crate::container::ContainerID;
use crate::stats::{ApiVersion, StatsDocument};

#[derive(Debug, serde::Deserialize)]
struct VersionResponse {
    #[serde(rename = "ApiVersion")]
    api_version: String,
}

#[derive(Debug, serde::Deserialize)]
struct ContainerSummary {
    #[serde(rename = "Id")]
    id: String,
}

/// How much of a response body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    Full,
    /// Up to the first newline; the rest of a streamed body is discarded.
    FirstLine,
}

/// [`StatsSource`] backed by the Docker Engine API.
///
/// Every request opens a new connection and is bounded by `timeout`, covering
/// connect, response headers and body.
#[derive(Debug, Clone)]
pub struct DockerSource {
    endpoint: Endpoint,
    connector: Connector,
    timeout: Duration,
    stream_stats: bool,
}

impl DockerSource {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self {
            connector: Connector::new(endpoint.clone()),
            endpoint,
            timeout,
            stream_stats: false,
        }
    }

    /// Requests container stats as a stream and samples its first line
    /// instead of asking for a single object.
    pub fn with_streamed_stats(mut self, stream_stats: bool) -> Self {
        self.stream_stats = stream_stats;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, mode: BodyMode) -> Result<T> {
        let body = self.fetch(path, mode).await?;
        serde_json::from_slice(&body).map_err(|source| {
            DecodeError {
                path: path.to_owned(),
                source,
            }
            .into()
        })
    }

    async fn fetch(
        &self,
        path: &str,
        mode: BodyMode,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        match tokio::time::timeout(self.timeout, self.fetch_inner(path, mode)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                path: path.to_owned(),
                timeout: self.timeout,
            }),
        }
    }

    async fn fetch_inner(
        &self,
        path: &str,
        mode: BodyMode,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.endpoint.request_path(path))
            .header(header::HOST, self.endpoint.host_header())
            .body(Empty::<Bytes>::new())
            .map_err(|source| TransportError::Request {
                path: path.to_owned(),
                source,
            })?;

        let io = self
            .connector
            .clone()
            .oneshot(request.uri().clone())
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: self.endpoint.to_string(),
                source,
            })?;

        let (mut sender, connection) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|source| TransportError::Handshake {
                endpoint: self.endpoint.to_string(),
                source,
            })?;
        {
            let endpoint = self.endpoint.to_string();
            tokio::spawn(async move {
                if let Err(err) = connection.await {
                    log::trace!("connection to {endpoint} closed: {err}");
                }
            });
        }

        log::trace!("GET {path}");
        let response = sender
            .send_request(request)
            .await
            .map_err(|source| TransportError::Send {
                path: path.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                path: path.to_owned(),
                status,
            });
        }

        read_body(response.into_body(), mode)
            .await
            .map_err(|source| TransportError::Body {
                path: path.to_owned(),
                source,
            })
    }
}

async fn read_body(
    mut body: Incoming,
    mode: BodyMode,
) -> std::result::Result<Vec<u8>, hyper::Error> {
    let mut buf = Vec::new();
    while let Some(frame) = body.frame().await {
        let Ok(data) = frame?.into_data() else {
            continue;
        };
        let start = buf.len();
        buf.extend_from_slice(&data);
        if mode == BodyMode::FirstLine {
            if let Some(pos) = buf[start..].iter().position(|b| *b == b'\n') {
                buf.truncate(start + pos);
                break;
            }
        }
    }
    Ok(buf)
}

impl StatsSource for DockerSource {
    async fn api_version(&self) -> Result<ApiVersion> {
        let version: VersionResponse = self.get_json("/version", BodyMode::Full).await?;
        Ok(ApiVersion::new(version.api_version))
    }

    async fn list_containers(&self) -> Result<Vec<ContainerID>> {
        let containers: Vec<ContainerSummary> =
            self.get_json("/containers/json", BodyMode::Full).await?;
        Ok(containers
            .into_iter()
            .filter_map(|c| match ContainerID::new(&c.id) {
                Ok(id) => Some(id),
                Err(err) => {
                    log::warn!("ignoring container: {err}");
                    None
                }
            })
            .collect())
    }

    async fn container_stats(&self, id: &ContainerID) -> Result<StatsDocument> {
        let path = format!("/containers/{id}/stats?stream={}", self.stream_stats);
        let value: serde_json::Value = self.get_json(&path, BodyMode::FirstLine).await?;
        Ok(StatsDocument::from(value))
    }

    async fn global_info(&self) -> Result<StatsDocument> {
        let value: serde_json::Value = self.get_json("/info", BodyMode::Full).await?;
        Ok(StatsDocument::from(value))
    }
}
