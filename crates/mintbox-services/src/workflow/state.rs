use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Mint,
    List,
    Remove,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowKind::Mint => write!(f, "mint"),
            WorkflowKind::List => write!(f, "list"),
            WorkflowKind::Remove => write!(f, "remove"),
        }
    }
}

/// `Idle -> Running -> {Succeeded, Failed}`; a finished workflow may run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Per-kind workflow state. Kinds are independent: a list may run during a mint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowTracker {
    mint: WorkflowStatus,
    list: WorkflowStatus,
    remove: WorkflowStatus,
}

impl WorkflowTracker {
    fn slot(&mut self, kind: WorkflowKind) -> &mut WorkflowStatus {
        match kind {
            WorkflowKind::Mint => &mut self.mint,
            WorkflowKind::List => &mut self.list,
            WorkflowKind::Remove => &mut self.remove,
        }
    }

    pub fn status(&self, kind: WorkflowKind) -> WorkflowStatus {
        match kind {
            WorkflowKind::Mint => self.mint,
            WorkflowKind::List => self.list,
            WorkflowKind::Remove => self.remove,
        }
    }

    pub fn is_running(&self, kind: WorkflowKind) -> bool {
        self.status(kind) == WorkflowStatus::Running
    }

    /// Move `kind` to `Running`. Returns false, changing nothing, when it already is.
    pub fn try_start(&mut self, kind: WorkflowKind) -> bool {
        let slot = self.slot(kind);
        if *slot == WorkflowStatus::Running {
            return false;
        }
        *slot = WorkflowStatus::Running;
        true
    }

    pub fn finish(&mut self, kind: WorkflowKind, succeeded: bool) {
        *self.slot(kind) = if succeeded {
            WorkflowStatus::Succeeded
        } else {
            WorkflowStatus::Failed
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_start_of_a_running_kind_is_refused() {
        let mut tracker = WorkflowTracker::default();
        assert!(tracker.try_start(WorkflowKind::Mint));
        assert!(!tracker.try_start(WorkflowKind::Mint));
        assert!(tracker.try_start(WorkflowKind::List));

        tracker.finish(WorkflowKind::Mint, false);
        assert_eq!(tracker.status(WorkflowKind::Mint), WorkflowStatus::Failed);
        assert!(tracker.try_start(WorkflowKind::Mint));
        assert_eq!(tracker.status(WorkflowKind::Remove), WorkflowStatus::Idle);
    }
}
