use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("http client error: {0}")]
    Http(String),
}
