#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when a resource call was rejected with 401 after the
    /// interceptor exhausted its single retry.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::Status { status: 401, .. })
        )
    }
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

// Implement conversion from std::io::Error
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(StorageError::Io(err.to_string()))
    }
}

// Implement conversion from url::ParseError
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("invalid URL: {}", err))
    }
}

// Implement conversion from reqwest::Error
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Transport(TransportError::Decode(err.to_string()))
        } else {
            Error::Transport(TransportError::Unreachable(err.to_string()))
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid credential format")]
    InvalidCredentialsFormat,

    #[error("Malformed authentication response")]
    MalformedResponse,

    #[error("Not authenticated")]
    NotAuthenticated,
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response decode error: {0}")]
    Decode(String),
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt session data: {0}")]
    Corrupt(String),
}
