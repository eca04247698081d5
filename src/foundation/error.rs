pub type AvatarResult<T> = Result<T, AvatarError>;

#[derive(thiserror::Error, Debug)]
pub enum AvatarError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("descriptor error: {0}")]
    Descriptor(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AvatarError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::Descriptor(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for AvatarError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
