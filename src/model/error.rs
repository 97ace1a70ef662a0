use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("UpYunStorageError: status {status}, {body}")]
    Upstream { status: u16, body: String },

    #[error("UpYunStorageError: failed to delete file")]
    DeleteRejected,

    #[error("File was opened for read-only access.")]
    ReadOnly,

    #[error("no open file cached for: {0}")]
    NotCached(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("file already closed: {0}")]
    Closed(String),

    #[error("missing `{header}` header for: {name}")]
    MissingHeader { name: String, header: &'static str },

    #[error("invalid `{header}` header for: {name}, {value}")]
    InvalidHeader {
        name: String,
        header: &'static str,
        value: String,
    },

    #[error("failed to read content: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to send request: {0}")]
    Transport(String),

    #[error("failed to acquire `{0}` guard")]
    Guard(&'static str),

    #[error("missing configuration: {0}")]
    Config(String),
}
