use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Publish error on subject {subject}: {message}")]
    Publish { subject: String, message: String },

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn transport(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn publish(subject: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Publish {
            subject: subject.into(),
            message: format!("{:#}", err),
        }
    }
}
