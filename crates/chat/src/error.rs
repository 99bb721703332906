use merchbell_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network-level failure before a usable response arrived.
    #[error("chat transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// The API answered, but refused the call.
    #[error("chat API rejected {method}: {reason}")]
    Rejected { method: String, reason: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn transport(source: reqwest::Error) -> Self {
        Self::Transport { source }
    }

    #[must_use]
    pub fn rejected(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            method: method.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

merchbell_common::impl_context!();
