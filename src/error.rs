//! Library error type

use std::fmt;

/// Errors surfaced outside the per-frame simulation
#[derive(Debug)]
pub enum GameError {
    /// Screen dimensions that cannot host a playfield
    InvalidScreen { width: f32, height: f32 },
    /// Reading a settings file failed
    Io(std::io::Error),
    /// A settings document could not be parsed
    Settings(serde_json::Error),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidScreen { width, height } => {
                write!(f, "invalid screen size {width}x{height}")
            }
            GameError::Io(err) => write!(f, "settings i/o error: {err}"),
            GameError::Settings(err) => write!(f, "malformed settings: {err}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::InvalidScreen { .. } => None,
            GameError::Io(err) => Some(err),
            GameError::Settings(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for GameError {
    fn from(err: std::io::Error) -> Self {
        GameError::Io(err)
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::Settings(err)
    }
}
