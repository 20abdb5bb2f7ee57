use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A year/month/hour value had a shape the formatter does not accept.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// The dataset identifier (or its monthly family) was not recognized.
    #[error("cannot classify dataset: {0}")]
    Classification(String),

    /// A place name could not be turned into a bounding box.
    #[error("cannot resolve area: {0}")]
    Resolution(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}
