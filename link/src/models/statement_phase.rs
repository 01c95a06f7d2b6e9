use serde::{Deserialize, Serialize};

/// Server-side lifecycle phase of a statement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementPhase {
    /// Accepted but not yet scheduled
    #[default]
    Pending,

    /// Executing; results may already be available
    Running,

    /// Finished successfully
    Completed,

    /// Finished with an error
    Failed,
}

impl StatementPhase {
    /// A terminal phase is never left again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatementPhase::Completed | StatementPhase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementPhase::Pending => "PENDING",
            StatementPhase::Running => "RUNNING",
            StatementPhase::Completed => "COMPLETED",
            StatementPhase::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for StatementPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
