use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Message build error: {0}")]
    MessageBuild(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for MailerError {
    fn from(err: config::ConfigError) -> Self {
        MailerError::Config(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MailerError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MailerError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MailerError>;
