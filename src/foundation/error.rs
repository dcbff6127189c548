/// Convenience result type used across keyreel.
pub type KeyreelResult<T> = Result<T, KeyreelError>;

/// Top-level error taxonomy used by the evaluation and compositing APIs.
#[derive(thiserror::Error, Debug)]
pub enum KeyreelError {
    /// Authored document data that violates a load-time precondition.
    #[error("validation error: {0}")]
    Validation(String),

    /// Animated property that cannot be evaluated (e.g. zero keyframes).
    #[error("animation error: {0}")]
    Animation(String),

    /// Scene state that cannot be evaluated for the current frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Drawing-surface failures (buffer sizes, layer stack misuse).
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing the project document.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KeyreelError {
    /// Build a [`KeyreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KeyreelError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`KeyreelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`KeyreelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`KeyreelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Message without the category prefix, for wrapping in outer context.
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(m)
            | Self::Animation(m)
            | Self::Evaluation(m)
            | Self::Render(m)
            | Self::Serde(m) => m.clone(),
            Self::Other(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
