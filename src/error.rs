use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Timeout,
    Status { status: u16, body: String },
    Protocol(String),
    InvalidArgument(String),
    UnsupportedOperation(String),
    Io(std::io::Error),
}

impl Error {
    /// HTTP status of a failed call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Timeout => write!(f, "request timed out"),
            Error::Status { status, body } if body.is_empty() => {
                write!(f, "server returned HTTP {status}")
            }
            Error::Status { status, body } => write!(f, "server returned HTTP {status}: {body}"),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::UnsupportedOperation(msg) => write!(f, "unsupported operation: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(e)
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
