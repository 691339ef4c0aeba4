use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeraldError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid source {name}: {reason}")]
    InvalidSource { name: String, reason: String },

    // Registry errors
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source already registered: {0}")]
    DuplicateSource(String),

    // Network errors
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    // Parsing errors
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("No content found: {0}")]
    NotFound(String),

    // Delivery errors
    #[error("Delivery failed: {0}")]
    Delivery(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failure should be treated by the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retried on the next interval.
    Transient,
    /// Raised at construction time, never from a running cycle.
    Fatal,
}

impl HeraldError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HeraldError::Network { .. }
            | HeraldError::HttpStatus { .. }
            | HeraldError::MalformedDocument(_)
            | HeraldError::NotFound(_)
            | HeraldError::Delivery(_)
            | HeraldError::Io(_) => ErrorKind::Transient,
            HeraldError::Config(_)
            | HeraldError::MissingEnvVar(_)
            | HeraldError::InvalidSource { .. }
            | HeraldError::UnknownSource(_)
            | HeraldError::DuplicateSource(_) => ErrorKind::Fatal,
        }
    }

    /// Emit this error at the level its category calls for.
    pub fn log(&self, source: &str) {
        match self {
            HeraldError::HttpStatus { .. } => tracing::info!(source, error = %self, "fetch rejected"),
            HeraldError::MalformedDocument(_) | HeraldError::NotFound(_) => {
                tracing::warn!(source, error = %self, "page layout may have changed")
            }
            HeraldError::Delivery(_) => tracing::error!(source, error = %self, "delivery failed"),
            _ => match self.kind() {
                ErrorKind::Transient => tracing::warn!(source, error = %self, "cycle failed"),
                ErrorKind::Fatal => tracing::error!(source, error = %self, "source misconfigured"),
            },
        }
    }
}

impl From<chatpost::ChatError> for HeraldError {
    fn from(err: chatpost::ChatError) -> Self {
        HeraldError::Delivery(err.to_string())
    }
}

impl From<toml::de::Error> for HeraldError {
    fn from(err: toml::de::Error) -> Self {
        HeraldError::Config(err.to_string())
    }
}

pub type HeraldResult<T> = Result<T, HeraldError>;
