use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeckoError {
    #[error("request timed out")]
    Timeout,

    #[error("request error: {0}")]
    Request(reqwest::Error),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    #[error("no price history for {asset_id} over {days} days")]
    NoData { asset_id: String, days: u32 },

    #[error("unsupported chart range: {0} days")]
    InvalidRange(u32),

    #[error("config error: {0}")]
    Config(String),
}

impl GeckoError {
    /// A well-formed response that carried no history.
    pub fn is_no_data(&self) -> bool {
        matches!(self, GeckoError::NoData { .. })
    }

    /// Transport, status, decode or timeout failure.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            GeckoError::Timeout
                | GeckoError::Request(_)
                | GeckoError::Http { .. }
                | GeckoError::Decode(_)
                | GeckoError::InvalidTimestamp(_)
        )
    }
}

impl From<reqwest::Error> for GeckoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeckoError::Timeout
        } else {
            GeckoError::Request(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, GeckoError>;
