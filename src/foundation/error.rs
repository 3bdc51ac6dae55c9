/// Convenience result type used across toonlink.
pub type ToonlinkResult<T> = Result<T, ToonlinkError>;

/// Top-level error taxonomy used by the engine APIs.
///
/// Only [`ToonlinkError::Decode`] and [`ToonlinkError::Validation`] are meant
/// to reach the end user as explicit feedback; asset-load and playback
/// failures are designed to degrade (placeholders, skipped events) before
/// they ever surface here.
#[derive(thiserror::Error, Debug)]
pub enum ToonlinkError {
    /// Malformed share token: bad tag, bad base64, failed decompression, or
    /// invalid JSON. The message carries the underlying cause.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid user-provided or creation data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Terminal asset load failure (retries exhausted).
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// Failure while driving timeline playback.
    #[error("playback error: {0}")]
    Playback(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ToonlinkError {
    /// Build a [`ToonlinkError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ToonlinkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ToonlinkError::AssetLoad`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Build a [`ToonlinkError::Playback`] value.
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }
}
