use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown operator tag, unsupported feature or malformed description
    #[error("configuration error: {0}")]
    Config(String),
    /// Unknown variable or value label
    #[error("lookup error: {0}")]
    Lookup(String),
    /// A structure that violates its construction invariants
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn lookup(msg: impl Into<String>) -> Self {
        Error::Lookup(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(format!("malformed description: {err}"))
    }
}
