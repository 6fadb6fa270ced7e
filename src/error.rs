use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("json parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("ticker parse error: {0}")]
    TickerParse(String),

    #[error("risk error: {0}")]
    Risk(#[from] crate::shield::RiskError),

    #[error("execution error: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, Error>;
