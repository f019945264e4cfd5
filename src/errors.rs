use thiserror::Error;

#[derive(Debug, Error)]
pub enum DroidFlowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Device command timed out after {0}ms")]
    DeviceTimeout(u64),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Matching error: {0}")]
    Matching(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl serde::Serialize for DroidFlowError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type DroidFlowResult<T> = Result<T, DroidFlowError>;
