use std::time::Duration;

/// Failure to reach the stats source or to get a usable response from it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unsupported stats source address `{0}`")]
    InvalidEndpoint(String),
    #[error("failed to connect to `{endpoint}`: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP handshake with `{endpoint}` failed: {source}")]
    Handshake {
        endpoint: String,
        #[source]
        source: hyper::Error,
    },
    #[error("failed to build request for `{path}`: {source}")]
    Request {
        path: String,
        #[source]
        source: hyper::http::Error,
    },
    #[error("request to `{path}` failed: {source}")]
    Send {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("request to `{path}` returned status {status}")]
    Status {
        path: String,
        status: hyper::StatusCode,
    },
    #[error("failed to read response body of `{path}`: {source}")]
    Body {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("request to `{path}` timed out after {timeout:?}")]
    Timeout { path: String, timeout: Duration },
}

/// The stats source answered, but the body is not the expected JSON.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode response of `{path}`: {source}")]
pub struct DecodeError {
    pub path: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
