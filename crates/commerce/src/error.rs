use merchbell_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network-level failure before a usable response arrived.
    #[error("commerce transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// The platform answered with an HTTP error, GraphQL errors, or
    /// mutation user errors.
    #[error("commerce API error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn transport(source: reqwest::Error) -> Self {
        Self::Transport { source }
    }

    #[must_use]
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
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
