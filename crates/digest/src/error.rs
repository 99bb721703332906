use merchbell_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] merchbell_store::Error),

    #[error(transparent)]
    Commerce(#[from] merchbell_commerce::Error),

    #[error(transparent)]
    Chat(#[from] merchbell_chat::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
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
