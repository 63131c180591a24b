//! Low-level git object publishing against a hosting API.
//!
//! `RepositoryObjectStore` is the capability set the sync flows need: read a
//! branch tip, create a ref, blob, tree and commit, move a ref, and fire a
//! workflow dispatch. `GitObjectClient` implements it over the GitHub REST
//! API; tests substitute their own implementation.

use serde_json::{Map, Value};

pub mod client;

pub use client::{GitHubConnector, GitObjectClient};

/// Regular, non-executable file.
pub const FILE_MODE: &str = "100644";

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Non-2xx status, or a 2xx body that is not JSON.
    #[error("{operation}: remote request failed with HTTP {status}: {body}")]
    RemoteRequestFailure { operation: &'static str, status: u16, body: String },
    #[error("branch '{0}' already exists")]
    DuplicateBranch(String),
    #[error("{operation}: unexpected response shape ({detail}): {body}")]
    MalformedResponse { operation: &'static str, detail: String, body: String },
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    /// Configured header value (api version, user agent) not valid in HTTP.
    #[error("invalid {header} header value '{value}'")]
    InvalidHeader { header: &'static str, value: String },
    #[error("{operation}: cannot encode request: {source}")]
    Encode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{operation}: transport error: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl GitError {
    pub fn failure<S: Into<String>>(operation: &'static str, status: u16, body: S) -> Self {
        GitError::RemoteRequestFailure { operation, status, body: body.into() }
    }

    /// HTTP status when the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitError::RemoteRequestFailure { status, .. } => Some(*status),
            GitError::DuplicateBranch(_) => Some(422),
            GitError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type GitResult<T> = Result<T, GitError>;

/// Everything a sync flow may ask of the remote repository. Each call is one
/// round trip; nothing is retried.
#[allow(async_fn_in_trait)]
pub trait RepositoryObjectStore {
    /// Sha at the tip of `branch`.
    async fn get_branch_tip(&self, branch: &str) -> GitResult<String>;

    /// Create `refs/heads/<name>` at `base_sha`; returns the sha the new ref points to.
    async fn create_branch(&self, name: &str, base_sha: &str) -> GitResult<String>;

    async fn create_blob(&self, content: &str) -> GitResult<String>;

    /// One-entry tree (`path` -> `blob_sha`, mode 100644) layered on `base_tree`.
    async fn create_tree(&self, path: &str, blob_sha: &str, base_tree: &str) -> GitResult<String>;

    /// Commit with exactly one parent.
    async fn create_commit(&self, message: &str, tree_sha: &str, parent_sha: &str) -> GitResult<String>;

    async fn update_branch_ref(&self, branch: &str, commit_sha: &str) -> GitResult<()>;

    async fn dispatch_workflow(&self, workflow: &str, ref_name: &str, inputs: &Map<String, Value>) -> GitResult<()>;
}

/// Turns a bearer token into a store. The token is only known once a flow
/// has looked it up, so flows hold a connector rather than a store.
pub trait ConnectRepository {
    type Store: RepositoryObjectStore;

    fn connect(&self, token: &str) -> GitResult<Self::Store>;
}

/// Percent-encode each `/`-separated segment, keeping the separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
