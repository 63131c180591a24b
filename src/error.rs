//! Flow-level error model.
//! Every sync flow returns `SyncResult`; the binary maps errors to a stable
//! code string for logs and to a process exit code.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::git::GitError;
use crate::sheet::WorkbookError;

/// Remote call sequence of the two flows, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Connect,
    GetBranchTip,
    CreateBranch,
    CreateBlob,
    CreateTree,
    CreateCommit,
    UpdateBranchRef,
    DispatchWorkflow,
}

impl SyncStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStep::Connect => "connect",
            SyncStep::GetBranchTip => "get_branch_tip",
            SyncStep::CreateBranch => "create_branch",
            SyncStep::CreateBlob => "create_blob",
            SyncStep::CreateTree => "create_tree",
            SyncStep::CreateCommit => "create_commit",
            SyncStep::UpdateBranchRef => "update_branch_ref",
            SyncStep::DispatchWorkflow => "dispatch_workflow",
        }
    }
}

impl Display for SyncStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shas produced so far by a commit flow. On failure this tells what already
/// exists remotely (e.g. a branch created before the blob upload failed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitProgress {
    pub tip: Option<String>,
    pub branch: Option<String>,
    pub blob: Option<String>,
    pub tree: Option<String>,
    pub commit: Option<String>,
}

impl CommitProgress {
    /// True once the feature branch exists remotely.
    pub fn branch_created(&self) -> bool {
        self.branch.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sheet '{0}' is not found")]
    SheetNotFound(String),
    #[error("credential property '{0}' is not set")]
    CredentialMissing(String),
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Writing the exported JSON failed.
    #[error("cannot write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{step} failed: {source}")]
    Remote {
        step: SyncStep,
        progress: CommitProgress,
        #[source]
        source: GitError,
    },
}

impl SyncError {
    pub fn remote(step: SyncStep, progress: &CommitProgress, source: GitError) -> Self {
        SyncError::Remote { step, progress: progress.clone(), source }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            SyncError::SheetNotFound(_) => "sheet_not_found",
            SyncError::CredentialMissing(_) => "credential_missing",
            SyncError::Workbook(_) => "workbook_error",
            SyncError::Config(_) => "config_error",
            SyncError::Output { .. } => "output_error",
            SyncError::Remote { source: GitError::DuplicateBranch(_), .. } => "duplicate_branch",
            SyncError::Remote { .. } => "remote_request_failure",
        }
    }

    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::SheetNotFound(_) | SyncError::CredentialMissing(_) => 3,
            SyncError::Workbook(_) => 4,
            SyncError::Config(_) => 2,
            SyncError::Output { .. } => 7,
            SyncError::Remote { source: GitError::DuplicateBranch(_), .. } => 6,
            SyncError::Remote { .. } => 5,
        }
    }

    /// Step that failed, for remote failures.
    pub fn step(&self) -> Option<SyncStep> {
        match self {
            SyncError::Remote { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<&CommitProgress> {
        match self {
            SyncError::Remote { progress, .. } => Some(progress),
            _ => None,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
