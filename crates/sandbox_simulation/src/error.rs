//! Ошибки scene layer
//!
//! Recoverable ошибок почти нет: graphics errors только логируются,
//! физика — инварианты. Наружу уходят только texture load и кривой config.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Collaborator не смог отдать texture handle (для демо — фатально)
    TextureLoad { name: String, reason: String },
    /// SceneConfig не прошёл валидацию / не распарсился
    Config(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::TextureLoad { name, reason } => {
                write!(f, "failed to load texture '{}': {}", name, reason)
            }
            SceneError::Config(reason) => write!(f, "invalid scene config: {}", reason),
        }
    }
}

impl std::error::Error for SceneError {}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        SceneError::Config(err.to_string())
    }
}
