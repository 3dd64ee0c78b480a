use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum EmbedError {
    Config(String),
    Network(String),
    Status { status: u16, body: String },
    Decode(String),
    UnexpectedShape(String),
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedError::Config(msg) => write!(f, "Embedder misconfigured: {msg}"),
            EmbedError::Network(msg) => write!(f, "Network error: {msg}"),
            EmbedError::Status { status, body } => {
                write!(f, "Embedding request failed ({status}): {body}")
            }
            EmbedError::Decode(msg) => write!(f, "Response decode error: {msg}"),
            EmbedError::UnexpectedShape(msg) => write!(f, "Unexpected embedding shape: {msg}"),
        }
    }
}

impl Error for EmbedError {}
