/// Crawl status definitions for tracking a crawl task's lifecycle
///
/// A task moves `Pending -> Running -> {Completed, Failed, Cancelled}`.
use std::fmt;

/// Represents the current state of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlStatus {
    /// Task accepted but traversal has not started
    Pending,

    /// Frontier is being drained by workers
    Running,

    // ===== Terminal States =====
    /// Traversal ended by a normal termination condition
    Completed,

    /// The seed could not be resolved at all
    Failed,

    /// Traversal stopped because cancellation was requested
    Cancelled,
}

impl CrawlStatus {
    /// Returns true if this is a terminal state (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: CrawlStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Guarded holder for a task's status that rejects invalid transitions
#[derive(Debug, Clone)]
pub struct CrawlLifecycle {
    status: CrawlStatus,
}

impl CrawlLifecycle {
    pub fn new() -> Self {
        Self {
            status: CrawlStatus::Pending,
        }
    }

    pub fn status(&self) -> CrawlStatus {
        self.status
    }

    /// Moves to `next`, failing with `InvalidTransition` if not allowed
    pub fn transition(&mut self, next: CrawlStatus) -> crate::Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(crate::LeadError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::debug!("Crawl status {} -> {}", self.status, next);
        self.status = next;
        Ok(())
    }
}

impl Default for CrawlLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
