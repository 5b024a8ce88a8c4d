use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Network error: {0}")]
    Network(anyhow::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(anyhow::Error),
}

