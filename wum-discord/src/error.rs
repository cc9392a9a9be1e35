use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscordApiError>;

#[derive(Debug, Error)]
pub enum DiscordApiError {
    /// Discord answered with a non-2xx status.
    #[error("discord api error: status={status} body={body}")]
    Status { status: u16, body: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl From<reqwest::Error> for DiscordApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<serde_json::Error> for DiscordApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseFormat(e.to_string())
    }
}
