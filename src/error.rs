pub type GenerationResult<T> = Result<T, GenerationError>;

/// Reasons a generation request is refused.
///
/// All of these are local to one request; previously compiled geometry is
/// never affected.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GenerationError {
    #[error("iteration count is invalid: {0}")]
    InvalidIterationCount(i64),

    #[error("curve too long: {estimated} steps (limit {limit})")]
    PathTooLarge { estimated: u64, limit: u64 },

    #[error("axiom contains no symbols")]
    EmptyOrUnparsableGrammar,
}

impl GenerationError {
    /// The predicted size that went over the ceiling, when the refusal came
    /// from the size gate.
    pub fn estimated_segments(&self) -> Option<u64> {
        match self {
            Self::PathTooLarge { estimated, .. } => Some(*estimated),
            _ => None,
        }
    }
}
