use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaneError>;

#[derive(Debug, Error)]
pub enum PaneError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("ui error: {0}")]
    Ui(#[from] eframe::Error),
}
