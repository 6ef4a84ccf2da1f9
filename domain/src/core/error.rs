//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Conflict has no positions to resolve")]
    NoPositions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::NoPositions.to_string(),
            "Conflict has no positions to resolve"
        );
    }
}
