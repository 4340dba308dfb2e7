use thiserror::Error;

pub type IntakeResult<T> = Result<T, IntakeError>;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Uploaded file is not a readable Excel workbook: {0}")]
    MalformedUpload(String),

    #[error("Session workbook could not be read back: {0}")]
    CorruptState(String),

    #[error("Failed to save workbook: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl IntakeError {
    /// True for errors caused by what the user sent rather than server state
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IntakeError::MalformedUpload(_)
                | IntakeError::Validation(_)
                | IntakeError::SessionNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = IntakeError::MalformedUpload("zip header missing".to_string());
        assert_eq!(
            err.to_string(),
            "Uploaded file is not a readable Excel workbook: zip header missing"
        );

        let err = IntakeError::Validation("Contract Value must be >= 0".to_string());
        assert_eq!(err.to_string(), "Invalid input: Contract Value must be >= 0");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(IntakeError::MalformedUpload(String::new()).is_client_error());
        assert!(IntakeError::Validation(String::new()).is_client_error());
        assert!(IntakeError::SessionNotFound(String::new()).is_client_error());
        assert!(!IntakeError::CorruptState(String::new()).is_client_error());
        assert!(!IntakeError::Serialization(String::new()).is_client_error());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: IntakeError = io.into();
        assert!(matches!(err, IntakeError::Io(_)));
    }
}
