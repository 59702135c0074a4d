//! The execution modes of a task

use std::fmt::{self, Display};

/// The execution intent of a task instance, fixed at construction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskMode {
    /// Deploys to a real network, persists outputs, and verifies sources
    Live,
    /// Deploys to an ephemeral network, persisting outputs to a test-scoped record
    Test,
    /// Never deploys, only reads previously persisted outputs
    ReadOnly,
    /// Validates deployability without submitting any transaction
    Check,
}

impl TaskMode {
    /// Whether tasks in this mode submit deployment transactions
    pub fn can_deploy(self) -> bool {
        matches!(self, TaskMode::Live | TaskMode::Test)
    }

    /// Whether tasks in this mode submit contracts for source verification
    pub fn verifies(self) -> bool {
        self == TaskMode::Live
    }
}

impl Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskMode::Live => write!(f, "LIVE"),
            TaskMode::Test => write!(f, "TEST"),
            TaskMode::ReadOnly => write!(f, "READ_ONLY"),
            TaskMode::Check => write!(f, "CHECK"),
        }
    }
}
