/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the request flow
/// can tell a rejected attachment apart from any other transport failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The transport refused the upload (network-class failure, usually size limits).
    #[error("attachment rejected: {0}")]
    AttachmentRejected(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
