use thiserror::Error;

/// Recoverable computation failures raised inside an analytics engine.
///
/// These never escape a pipeline entry point: the pipeline converts them
/// into the `error` field of its result object so callers always receive a
/// complete, typed shape. Only upstream data-access failures
/// ([`crate::source::SourceError`]) propagate as `Err`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ComputationError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("model fitting failed: {0}")]
    ModelFit(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::ComputationError;

    #[test]
    fn display_keeps_the_stage_context() {
        let error = ComputationError::InsufficientData(
            "need at least 7 days of history, got 3".to_string(),
        );
        assert_eq!(
            error.to_string(),
            "insufficient data: need at least 7 days of history, got 3"
        );
    }
}
