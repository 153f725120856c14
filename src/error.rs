use std::process::ExitCode;

/// Everything that can end the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::Error),
    #[error("stats source unavailable: {0}")]
    Source(#[from] crate::source::Error),
    #[error("unexpected stats layout: {0}")]
    Schema(#[from] crate::stats::SchemaError),
    #[error("failed to write metrics: {0}")]
    Output(#[source] std::io::Error),
    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Process exit status for this error. The poll loop has no regular end,
    /// so an interrupt exits with a failure status as well.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::Config(_)
            | Error::Source(_)
            | Error::Schema(_)
            | Error::Output(_)
            | Error::Interrupted => ExitCode::FAILURE,
        }
    }

    /// Whether `main` should report this error at error level.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Error::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_exits_with_failure() {
        let errors = [
            Error::Config(crate::config::Error::InvalidFlag {
                var: "STATS_STREAM",
                value: "maybe".into(),
            }),
            Error::Schema(crate::stats::SchemaError::NotAMapping {
                path: "networks".into(),
                found: "number",
            }),
            Error::Output(std::io::Error::from(std::io::ErrorKind::BrokenPipe)),
            Error::Interrupted,
        ];
        for err in &errors {
            assert_eq!(err.exit_code(), ExitCode::FAILURE, "{err}");
        }
    }

    #[test]
    fn test_interrupt_is_not_reported_as_failure() {
        assert!(!Error::Interrupted.is_failure());
        assert!(Error::Output(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).is_failure());
    }
}
