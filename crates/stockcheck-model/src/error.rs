//! Validation errors for stock check records

/// Errors raised when a record fails boundary validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Report contains no checked machine and no verified item
    #[error("report must check at least one machine or verify one item")]
    EmptyReport,

    /// A quantity field holds a negative value
    #[error("negative {field} ({value}) for {entity}")]
    NegativeQuantity {
        /// Entity the quantity belongs to (item id or machine/slot path)
        entity: String,
        /// Offending field name
        field: &'static str,
        /// Offending value
        value: i64,
    },

    /// A map key or reference that must identify an entity is blank
    #[error("blank identifier in {0}")]
    BlankIdentifier(String),

    /// Submission id could not be parsed
    #[error("invalid submission id: {0}")]
    InvalidSubmissionId(String),

    /// Unknown machine status text
    #[error("unknown machine status: {0}")]
    UnknownMachineStatus(String),

    /// Unknown queue mode text
    #[error("unknown queue mode: {0}")]
    UnknownQueueMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_quantity_display() {
        let err = ModelError::NegativeQuantity {
            entity: "i1".to_string(),
            field: "actualQty",
            value: -3,
        };
        assert_eq!(err.to_string(), "negative actualQty (-3) for i1");
    }

    #[test]
    fn empty_report_display() {
        assert!(ModelError::EmptyReport.to_string().contains("at least one machine"));
    }
}
