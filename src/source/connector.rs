use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{self, Poll};

use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, UnixStream};

use super::TransportError;

/// Address of the stats source.
///
/// Accepted forms are `unix://<socket path>` (with or without the leading
/// slash of the path, e.g. `unix://var/run/docker.sock`) and
/// `http://<host>:<port>[/<path prefix>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp { authority: String, base_path: String },
}

impl Endpoint {
    /// Parses a base address.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidEndpoint`] for any other scheme or an
    /// empty socket path / authority.
    pub fn parse(uri: &str) -> Result<Self, TransportError> {
        if let Some(path) = uri.strip_prefix("unix://") {
            let path = path.trim_end_matches('/');
            if path.is_empty() {
                return Err(TransportError::InvalidEndpoint(uri.to_owned()));
            }
            return Ok(Endpoint::Unix(Path::new("/").join(path.trim_start_matches('/'))));
        }

        if let Some(rest) = uri.strip_prefix("http://") {
            let (authority, base_path) = match rest.find('/') {
                Some(idx) => (&rest[..idx], rest[idx..].trim_end_matches('/')),
                None => (rest, ""),
            };
            if authority.is_empty() {
                return Err(TransportError::InvalidEndpoint(uri.to_owned()));
            }
            return Ok(Endpoint::Tcp {
                authority: authority.to_owned(),
                base_path: base_path.to_owned(),
            });
        }

        Err(TransportError::InvalidEndpoint(uri.to_owned()))
    }

    /// Value of the `Host` header sent with each request.
    pub fn host_header(&self) -> &str {
        match self {
            Endpoint::Unix(_) => "localhost",
            Endpoint::Tcp { authority, .. } => authority,
        }
    }

    /// Prepends the endpoint's path prefix, if any, to an API path.
    pub fn request_path(&self, path: &str) -> String {
        match self {
            Endpoint::Unix(_) => path.to_owned(),
            Endpoint::Tcp { base_path, .. } => format!("{base_path}{path}"),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp {
                authority,
                base_path,
            } => write!(f, "http://{authority}{base_path}"),
        }
    }
}

/// A connected byte stream to the stats source.
#[derive(Debug)]
pub enum Stream {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Unix(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Stream::Unix(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Unix(s) => Pin::new(s).poll_flush(cx),
            Stream::Tcp(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Unix(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// Opens a fresh stream to the endpoint for every request.
#[derive(Debug, Clone)]
pub struct Connector {
    endpoint: Endpoint,
}

impl Connector {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl tower::Service<hyper::Uri> for Connector {
    type Response = TokioIo<Stream>;

    type Error = io::Error;

    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: hyper::Uri) -> Self::Future {
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            let stream = match endpoint {
                Endpoint::Unix(path) => {
                    log::trace!("Connecting to {}...", path.display());
                    Stream::Unix(UnixStream::connect(path).await?)
                }
                Endpoint::Tcp { authority, .. } => {
                    log::trace!("Connecting to {authority}...");
                    Stream::Tcp(TcpStream::connect(authority.as_str()).await?)
                }
            };

            Ok(TokioIo::new(stream))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unix_without_leading_slash() {
        assert_eq!(
            Endpoint::parse("unix://var/run/docker.sock").unwrap(),
            Endpoint::Unix(PathBuf::from("/var/run/docker.sock"))
        );
    }

    #[test]
    fn test_parse_unix_absolute() {
        assert_eq!(
            Endpoint::parse("unix:///run/docker.sock").unwrap(),
            Endpoint::Unix(PathBuf::from("/run/docker.sock"))
        );
    }

    #[test]
    fn test_parse_tcp_with_prefix() {
        let endpoint = Endpoint::parse("http://127.0.0.1:2375/v1.21/").unwrap();
        assert_eq!(
            endpoint,
            Endpoint::Tcp {
                authority: "127.0.0.1:2375".into(),
                base_path: "/v1.21".into()
            }
        );
        assert_eq!(endpoint.host_header(), "127.0.0.1:2375");
        assert_eq!(endpoint.request_path("/info"), "/v1.21/info");
        assert_eq!(endpoint.to_string(), "http://127.0.0.1:2375/v1.21");
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!(matches!(
            Endpoint::parse("https://example.com"),
            Err(TransportError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            Endpoint::parse("unix://"),
            Err(TransportError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            Endpoint::parse("http:///path"),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }
}
