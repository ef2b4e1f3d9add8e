use std::time::Duration;

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid window: {0:?}, expected a positive whole number of seconds")]
    InvalidWindow(Duration),
    #[error("{0}")]
    Msg(String),
    #[error("{0}")]
    Anyhow(anyhow::Error),
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::Msg(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Self::Msg(e.to_owned())
    }
}

impl From<anyhow::Error> for Error {
    #[inline]
    fn from(e: anyhow::Error) -> Self {
        Error::Anyhow(e)
    }
}
