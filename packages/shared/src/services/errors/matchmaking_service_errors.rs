#[derive(Debug, PartialEq)]
pub enum MatchmakingServiceError {
    MatchNotFound,
    MatchAlreadyCompleted,
}

impl std::fmt::Display for MatchmakingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchmakingServiceError::MatchNotFound => write!(f, "Match not found"),
            MatchmakingServiceError::MatchAlreadyCompleted => {
                write!(f, "Match is already completed")
            }
        }
    }
}

impl std::error::Error for MatchmakingServiceError {}
