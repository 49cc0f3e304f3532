use thiserror::Error;

/// STL decoding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StlError {
    #[error("file too short for an STL header ({0} bytes)")]
    MissingHeader(usize),

    #[error("truncated binary STL: header declares {declared} triangles, data holds {available}")]
    Truncated { declared: u32, available: usize },

    #[error("ASCII STL line {line}: {message}")]
    Ascii { line: usize, message: String },

    #[error("mesh contains no triangles")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ViewportError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("{url} answered HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse failed: {0}")]
    Parse(#[from] StlError),

    #[error("load task ended without a result")]
    Abandoned,
}

impl From<reqwest::Error> for ViewportError {
    fn from(err: reqwest::Error) -> Self {
        ViewportError::Fetch(err.to_string())
    }
}

pub type ViewportResult<T> = Result<T, ViewportError>;
