/// Convenience result type used across strata.
pub type StrataResult<T> = Result<T, StrataError>;

/// Top-level error taxonomy of the compositor.
#[derive(thiserror::Error, Debug)]
pub enum StrataError {
    /// Invalid layer descriptors, params or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// A shader graph that fails to type-check or emit.
    #[error("shader error: {0}")]
    Shader(String),

    /// Backend failures: adapters, textures, submissions.
    #[error("device error: {0}")]
    Device(String),

    /// A pool, queue or budget ran out.
    #[error("resource exhausted: {0}")]
    Exhausted(String),

    /// Media frames that cannot be decoded or uploaded.
    #[error("media error: {0}")]
    Media(String),

    /// An operation called in the wrong pipeline state.
    #[error("invalid state: {0}")]
    State(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StrataError {
    /// Build a [`StrataError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StrataError::Shader`] value.
    pub fn shader(msg: impl Into<String>) -> Self {
        Self::Shader(msg.into())
    }

    /// Build a [`StrataError::Device`] value.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Build a [`StrataError::Exhausted`] value.
    pub fn exhausted(msg: impl Into<String>) -> Self {
        Self::Exhausted(msg.into())
    }

    /// Build a [`StrataError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`StrataError::State`] value.
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
