use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Path requested over zero slots.
    EmptyRange,
    /// A slot with no court left to assign.
    UnsatisfiableSlot { start: NaiveDateTime },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::EmptyRange => write!(f, "cannot build a court path over an empty range"),
            EngineError::UnsatisfiableSlot { start } => {
                write!(f, "no court available for slot starting at {start}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
