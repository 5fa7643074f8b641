use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyholdError {
    #[error("Failed to start ssh-agent: {0}")]
    AgentStart(String),

    #[error("Failed to add key to agent: {0}")]
    KeyAdd(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Could not determine home directory")]
    HomeNotFound,

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KeyholdError>;
