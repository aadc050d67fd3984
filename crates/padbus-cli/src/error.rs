use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("config error: {0}")]
    Config(#[from] padbus::ConfigError),
    #[error("bus error: {0}")]
    Bus(#[from] padbus::Error),
    #[error("failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
