use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] lookout_core::error::Error),
}
