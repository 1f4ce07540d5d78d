use thiserror::Error;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Failure kinds detected while driving the site-management tool.
///
/// None of these cross the public call boundary in [`crate::wp`]; they are
/// logged and folded into a `(false, ...)` return there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("exit={code}")]
    NonZeroExit { code: i32 },

    #[error("no structured payload: {0}")]
    ParseFailure(String),

    #[error("spawn failed: {0}")]
    Spawn(String),
}

impl AdapterError {
    pub fn invalid(context: impl Into<String>) -> Self {
        AdapterError::InvalidCommand(context.into())
    }

    pub fn parse(context: impl Into<String>) -> Self {
        AdapterError::ParseFailure(context.into())
    }

    /// Exit code surfaced in logs: the real one, or the timeout sentinel.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            AdapterError::Timeout { .. } => Some(crate::process::TIMEOUT_EXIT_CODE),
            AdapterError::NonZeroExit { code } => Some(*code),
            _ => None,
        }
    }
}
