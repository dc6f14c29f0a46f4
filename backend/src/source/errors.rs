use market::quote::QuoteParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("live source timed out")]
    Timeout,

    #[error("http error: {0}")]
    Transport(reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("malformed upstream payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Transport(e)
        }
    }
}

impl From<QuoteParseError> for FetchError {
    fn from(e: QuoteParseError) -> Self {
        FetchError::Malformed(e.to_string())
    }
}
