use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("coingecko error: {0}")]
    Gecko(#[from] gecko::GeckoError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}
