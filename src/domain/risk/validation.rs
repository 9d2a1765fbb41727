use crate::domain::errors::SafetyViolation;

/// Result of a safety check
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// Trade can proceed
    Approve,
    /// Trade must not be submitted
    Reject(SafetyViolation),
}

impl ValidationResult {
    pub fn is_approved(&self) -> bool {
        matches!(self, ValidationResult::Approve)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ValidationResult::Reject(_))
    }

    pub fn violation(&self) -> Option<&SafetyViolation> {
        match self {
            ValidationResult::Reject(violation) => Some(violation),
            ValidationResult::Approve => None,
        }
    }

    /// Human-readable deny reason
    pub fn rejection_reason(&self) -> Option<String> {
        self.violation().map(|v| v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_reason_renders_violation() {
        let result = ValidationResult::Reject(SafetyViolation::DailyTradeLimit {
            count: 20,
            limit: 20,
        });
        assert!(result.is_rejected());
        assert!(result.rejection_reason().unwrap().contains("Daily trade limit"));
        assert_eq!(ValidationResult::Approve.rejection_reason(), None);
    }
}
