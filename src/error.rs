use thiserror::Error;

/// Failures while fetching or parsing the feed.
///
/// During steady-state polling these are soft: the cycle is logged and
/// skipped.  At startup they abort the process.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed server answered with HTTP {status}")]
    Status { status: u16 },

    #[error("feed parsing failed: {0}")]
    Parse(#[from] rss::Error),
}

/// Failures while handing a notification to the transport.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification rejected (HTTP {status}): {}", .errors.join("; "))]
    Rejected { status: u16, errors: Vec<String> },

    #[error("malformed provider response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// The only fatal errors: validation performed before the pipeline starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("notification credentials could not be verified: {0}")]
    Notifier(#[source] NotifyError),

    #[error("feed {url} could not be validated: {source}")]
    Feed {
        url: String,
        #[source]
        source: SourceError,
    },
}
