use std::fmt;

#[derive(Debug)]
pub enum GenerateError {
    Config(String),
    Network(String),
    Status { status: u16, body: String },
    Decode(String),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Config(msg) => write!(f, "generator misconfigured: {msg}"),
            GenerateError::Network(msg) => write!(f, "generator unreachable: {msg}"),
            GenerateError::Status { status, body } => {
                write!(f, "generator returned {status}: {body}")
            }
            GenerateError::Decode(msg) => write!(f, "generator response unreadable: {msg}"),
        }
    }
}

impl std::error::Error for GenerateError {}
