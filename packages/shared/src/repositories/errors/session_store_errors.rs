#[derive(Debug)]
pub enum SessionStoreError {
    Serialization(String),
    Backend(String),
}

impl std::fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            SessionStoreError::Backend(msg) => write!(f, "Session store error: {}", msg),
        }
    }
}

impl std::error::Error for SessionStoreError {}
