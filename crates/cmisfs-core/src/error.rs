/// Errors raised by the repository session layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    /// No object for the given identifier.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// An object of the same name already exists at the target location.
    #[error("Object already exists: {0}")]
    Conflict(String),

    /// A children/create operation hit a non-folder object.
    #[error("Object is not a folder: {0}")]
    NotAFolder(String),

    /// Connection to the repository failed.
    #[error("Connection '{connection}' failed")]
    ConnectionFailed {
        connection: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out for object: {object}")]
    Timeout { operation: String, object: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The repository answered with something the binding cannot decode.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl SessionError {
    /// Returns true if this error is transient and the operation may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::ConnectionFailed { .. } => true,
            SessionError::Timeout { .. } => true,
            SessionError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

/// Errors raised by the filesystem driver.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DriverError {
    /// Identifier does not resolve to any object.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Identifier resolves, but not to a document.
    #[error("File does not exist: {0}")]
    FileNotFound(String),

    /// Identifier resolves, but not to a folder.
    #[error("Folder does not exist: {0}")]
    FolderNotFound(String),

    /// A metadata key outside the fixed extraction set was requested.
    #[error("The information \"{0}\" is not available")]
    UnknownInfoKey(String),

    /// Root folder cannot be determined; the storage must be marked
    /// temporarily unusable rather than crash the host.
    #[error("Storage configuration error: {0}")]
    Configuration(String),

    /// Public accessibility is mandated but the document has no rendition.
    #[error("Document '{0}' has no rendition in the repository")]
    MissingRendition(String),

    /// Session-level error.
    #[error("Session error: {0}")]
    Session(#[source] Box<SessionError>),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SessionError> for DriverError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(id) => DriverError::NotFound(id),
            SessionError::Io(io_err) => DriverError::Io(io_err),
            other => DriverError::Session(Box::new(other)),
        }
    }
}

impl From<cmisfs_config::ConfigError> for DriverError {
    fn from(e: cmisfs_config::ConfigError) -> Self {
        DriverError::Configuration(e.to_string())
    }
}
