//! The sync flows: sheet -> JSON -> repository.
//!
//! Commit flow: tip of the main branch, new feature branch, blob, tree,
//! commit, ref update. Each step consumes the sha of an earlier one, so the
//! calls run strictly in order and the first failure ends the flow.
//! Dispatch flow: a single workflow-dispatch call carrying the JSON.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::credentials::CredentialStore;
use crate::error::{CommitProgress, SyncError, SyncResult, SyncStep};
use crate::git::{ConnectRepository, RepositoryObjectStore};
use crate::serialize::{serialize, to_json, RecordSet};
use crate::sheet::Workbook;

/// Result of a successful commit flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub branch: String,
    pub file_name: String,
    pub commit_sha: String,
    pub records: usize,
}

pub struct SyncOrchestrator<W, C, R> {
    config: SyncConfig,
    workbook: W,
    credentials: C,
    connector: R,
}

impl<W, C, R> SyncOrchestrator<W, C, R> {
    pub fn new(config: SyncConfig, workbook: W, credentials: C, connector: R) -> Self {
        Self { config, workbook, credentials, connector }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl<W: Workbook, C, R> SyncOrchestrator<W, C, R> {
    /// Reads the configured sheet and builds its records.
    pub fn load_records(&self) -> SyncResult<RecordSet> {
        let range = self.config.column_range().map_err(|e| SyncError::Config(e.to_string()))?;
        let Some(sheet) = self.workbook.sheet_by_name(&self.config.sheet_name)? else {
            warn!(target: "sheetsync::sync", "failed: sheet(name is '{}') is not found", self.config.sheet_name);
            return Err(SyncError::SheetNotFound(self.config.sheet_name.clone()));
        };
        let records = serialize(&sheet.values(range));
        info!(
            target: "sheetsync::sync",
            "sheet '{}' serialized: rows={} records={} columns={}",
            sheet.name, sheet.row_count(), records.len(), range
        );
        Ok(records)
    }

    /// JSON text of the sheet, for saving locally.
    pub fn generate_for_download(&self) -> SyncResult<String> {
        Ok(to_json(&self.load_records()?))
    }
}

impl<W: Workbook, C: CredentialStore, R: ConnectRepository> SyncOrchestrator<W, C, R> {
    fn connect(&self) -> SyncResult<R::Store> {
        let Some(token) = self.credentials.get_property(&self.config.token_property) else {
            warn!(target: "sheetsync::sync", "failed: credential '{}' is not set", self.config.token_property);
            return Err(SyncError::CredentialMissing(self.config.token_property.clone()));
        };
        self.connector
            .connect(&token)
            .map_err(|e| SyncError::remote(SyncStep::Connect, &CommitProgress::default(), e))
    }

    /// Commits the sheet JSON as `file_name` on a fresh `feature_branch` cut from `main_branch`.
    /// An existing feature branch is a hard failure (`duplicate_branch`); nothing after
    /// the branch step runs in that case.
    pub async fn commit(&self) -> SyncResult<CommitOutcome> {
        let records = self.load_records()?;
        let json = to_json(&records);
        let store = self.connect()?;
        let cfg = &self.config;
        info!(
            target: "sheetsync::sync",
            "commit flow: {} -> {} ({}, {} bytes)",
            cfg.main_branch, cfg.feature_branch, cfg.file_name, json.len()
        );

        let mut progress = CommitProgress::default();

        let tip = store
            .get_branch_tip(&cfg.main_branch)
            .await
            .map_err(|e| fail(SyncStep::GetBranchTip, &progress, e))?;
        info!(target: "sheetsync::sync", "tip of {}: {}", cfg.main_branch, tip);
        progress.tip = Some(tip.clone());

        let branch_sha = store
            .create_branch(&cfg.feature_branch, &tip)
            .await
            .map_err(|e| fail(SyncStep::CreateBranch, &progress, e))?;
        info!(target: "sheetsync::sync", "branch {} created at {}", cfg.feature_branch, branch_sha);
        progress.branch = Some(branch_sha.clone());

        let blob_sha = store
            .create_blob(&json)
            .await
            .map_err(|e| fail(SyncStep::CreateBlob, &progress, e))?;
        info!(target: "sheetsync::sync", "blob {}", blob_sha);
        progress.blob = Some(blob_sha.clone());

        let tree_sha = store
            .create_tree(&cfg.file_name, &blob_sha, &branch_sha)
            .await
            .map_err(|e| fail(SyncStep::CreateTree, &progress, e))?;
        info!(target: "sheetsync::sync", "tree {}", tree_sha);
        progress.tree = Some(tree_sha.clone());

        let commit_sha = store
            .create_commit(&cfg.commit_message, &tree_sha, &branch_sha)
            .await
            .map_err(|e| fail(SyncStep::CreateCommit, &progress, e))?;
        info!(target: "sheetsync::sync", "commit {}", commit_sha);
        progress.commit = Some(commit_sha.clone());

        store
            .update_branch_ref(&cfg.feature_branch, &commit_sha)
            .await
            .map_err(|e| fail(SyncStep::UpdateBranchRef, &progress, e))?;
        info!(target: "sheetsync::sync", "{} now at {}", cfg.feature_branch, commit_sha);

        Ok(CommitOutcome {
            branch: cfg.feature_branch.clone(),
            file_name: cfg.file_name.clone(),
            commit_sha,
            records: records.len(),
        })
    }

    /// Fires the configured workflow on `main_branch` with the sheet JSON as an input.
    pub async fn dispatch(&self) -> SyncResult<()> {
        let json = self.generate_for_download()?;
        let store = self.connect()?;
        let cfg = &self.config;
        let mut inputs = Map::new();
        inputs.insert(cfg.workflow_input.clone(), Value::String(json));
        info!(target: "sheetsync::sync", "dispatch flow: workflow {} on {}", cfg.workflow, cfg.main_branch);
        store
            .dispatch_workflow(&cfg.workflow, &cfg.main_branch, &inputs)
            .await
            .map_err(|e| fail(SyncStep::DispatchWorkflow, &CommitProgress::default(), e))?;
        info!(target: "sheetsync::sync", "workflow {} dispatched", cfg.workflow);
        Ok(())
    }
}

fn fail(step: SyncStep, progress: &CommitProgress, e: crate::git::GitError) -> SyncError {
    warn!(target: "sheetsync::sync", "{} failed: {}", step, e);
    if progress.branch_created() {
        warn!(target: "sheetsync::sync", "partial commit left behind: {:?}", progress);
    }
    SyncError::remote(step, progress, e)
}
