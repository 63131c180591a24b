//! Sync configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file, then
//! `SHEETSYNC_*` environment variables. The binary applies CLI flags last.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::sheet::ColumnRange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// API root, e.g. `https://api.github.com`.
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Value sent in `X-GitHub-Api-Version`.
    pub api_version: String,
    pub user_agent: String,
    pub sheet_name: String,
    /// Column span read from the sheet, spreadsheet notation.
    pub columns: String,
    /// Credential property holding the bearer token.
    pub token_property: String,
    pub main_branch: String,
    pub feature_branch: String,
    /// Repository path of the committed JSON file.
    pub file_name: String,
    pub commit_message: String,
    /// Workflow file name or numeric id for the dispatch flow.
    pub workflow: String,
    /// Key under which the JSON is passed in the workflow inputs.
    pub workflow_input: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            owner: String::new(),
            repo: String::new(),
            api_version: "2022-11-28".to_string(),
            user_agent: concat!("sheetsync/", env!("CARGO_PKG_VERSION")).to_string(),
            sheet_name: "master".to_string(),
            columns: "A:C".to_string(),
            token_property: "GITHUB_PAT".to_string(),
            main_branch: "main".to_string(),
            feature_branch: "sheetsync/update-json".to_string(),
            file_name: "data.json".to_string(),
            commit_message: "Sync json".to_string(),
            workflow: "sync.yml".to_string(),
            workflow_input: "json".to_string(),
        }
    }
}

const ENV_KEYS: &[&str] = &[
    "SHEETSYNC_API_BASE",
    "SHEETSYNC_OWNER",
    "SHEETSYNC_REPO",
    "SHEETSYNC_API_VERSION",
    "SHEETSYNC_USER_AGENT",
    "SHEETSYNC_SHEET",
    "SHEETSYNC_COLUMNS",
    "SHEETSYNC_TOKEN_PROPERTY",
    "SHEETSYNC_MAIN_BRANCH",
    "SHEETSYNC_FEATURE_BRANCH",
    "SHEETSYNC_FILE_NAME",
    "SHEETSYNC_COMMIT_MESSAGE",
    "SHEETSYNC_WORKFLOW",
    "SHEETSYNC_WORKFLOW_INPUT",
];

impl SyncConfig {
    /// Defaults overlaid with the file at `path`; fields missing from the file keep their default.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn apply_env(&mut self) {
        self.apply_vars(|k| std::env::var(k).ok());
    }

    fn apply_vars<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        for &key in ENV_KEYS {
            if let Some(v) = lookup(key).filter(|v| !v.is_empty()) {
                if let Some(field) = self.env_field(key) {
                    *field = v;
                }
            }
        }
    }

    fn env_field(&mut self, key: &str) -> Option<&mut String> {
        let field = match key {
            "SHEETSYNC_API_BASE" => &mut self.api_base,
            "SHEETSYNC_OWNER" => &mut self.owner,
            "SHEETSYNC_REPO" => &mut self.repo,
            "SHEETSYNC_API_VERSION" => &mut self.api_version,
            "SHEETSYNC_USER_AGENT" => &mut self.user_agent,
            "SHEETSYNC_SHEET" => &mut self.sheet_name,
            "SHEETSYNC_COLUMNS" => &mut self.columns,
            "SHEETSYNC_TOKEN_PROPERTY" => &mut self.token_property,
            "SHEETSYNC_MAIN_BRANCH" => &mut self.main_branch,
            "SHEETSYNC_FEATURE_BRANCH" => &mut self.feature_branch,
            "SHEETSYNC_FILE_NAME" => &mut self.file_name,
            "SHEETSYNC_COMMIT_MESSAGE" => &mut self.commit_message,
            "SHEETSYNC_WORKFLOW" => &mut self.workflow,
            "SHEETSYNC_WORKFLOW_INPUT" => &mut self.workflow_input,
            _ => return None,
        };
        Some(field)
    }

    pub fn column_range(&self) -> Result<ColumnRange> {
        Ok(ColumnRange::parse(&self.columns)?)
    }

    /// `https://<host>/repos/<owner>/<repo>`
    pub fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo)
        )
    }

    /// Checks needed before any remote call is made.
    pub fn validate_remote(&self) -> Result<()> {
        if self.owner.is_empty() || self.repo.is_empty() {
            return Err(anyhow!("repository owner and name must be configured (SHEETSYNC_OWNER / SHEETSYNC_REPO)"));
        }
        if self.feature_branch == self.main_branch {
            return Err(anyhow!("feature branch must differ from main branch '{}'", self.main_branch));
        }
        if self.file_name.is_empty() {
            return Err(anyhow!("file_name must not be empty"));
        }
        self.column_range()?;
        Ok(())
    }
}
