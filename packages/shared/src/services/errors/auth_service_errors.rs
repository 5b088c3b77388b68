#[derive(Debug, PartialEq)]
pub enum AuthServiceError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    ValidationError(String),
}

impl std::fmt::Display for AuthServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthServiceError::MissingToken => write!(f, "Authentication required"),
            AuthServiceError::InvalidToken => write!(f, "Invalid token"),
            AuthServiceError::ExpiredToken => write!(f, "Token has expired"),
            AuthServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for AuthServiceError {}
