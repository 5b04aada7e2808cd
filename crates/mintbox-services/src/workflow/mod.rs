//! Workflow state, the activity log and workflow outcomes

mod log;
mod outcome;
mod state;

pub use log::{ActivityLog, LogEntry, Status, StatusKind};
pub use outcome::{
    Dispatch, ListError, MintError, MintReport, OrphanError, OrphanReport, RemoveError,
    RemoveOutcome,
};
pub use state::{WorkflowKind, WorkflowStatus, WorkflowTracker};
