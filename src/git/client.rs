use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{encode_path, ConnectRepository, GitError, GitResult, RepositoryObjectStore, FILE_MODE};
use crate::config::SyncConfig;

const ACCEPT_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";

#[derive(Debug, Deserialize)]
struct ShaBody {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefBody {
    object: ShaBody,
}

#[derive(Serialize)]
struct NewRef<'a> {
    #[serde(rename = "ref")]
    refname: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct NewBlob<'a> {
    content: String,
    encoding: &'a str,
}

#[derive(Serialize)]
struct TreeEntry<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct NewTree<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntry<'a>>,
}

#[derive(Serialize)]
struct NewCommit<'a> {
    message: &'a str,
    tree: &'a str,
    parents: [&'a str; 1],
}

#[derive(Serialize)]
struct RefUpdate<'a> {
    sha: &'a str,
}

#[derive(Serialize)]
struct Dispatch<'a> {
    #[serde(rename = "ref")]
    refname: &'a str,
    inputs: &'a Map<String, Value>,
}

/// Authenticated session against `https://<host>/repos/<owner>/<repo>`.
#[derive(Clone)]
pub struct GitObjectClient {
    base: String,
    client: reqwest::Client,
}

impl GitObjectClient {
    pub fn new(repo_url: &str, token: &str, api_version: &str, user_agent: &str) -> GitResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| GitError::InvalidCredential("token contains characters not allowed in a header".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(
            API_VERSION_HEADER,
            HeaderValue::from_str(api_version)
                .map_err(|_| GitError::InvalidHeader { header: API_VERSION_HEADER, value: api_version.to_string() })?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|_| GitError::InvalidHeader { header: "user-agent", value: user_agent.to_string() })?,
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GitError::Transport { operation: "connect", source: e })?;
        Ok(Self { base: repo_url.trim_end_matches('/').to_string(), client })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    // GET sends neither body nor content type; everything else sends JSON.
    async fn send<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GitResult<(StatusCode, String)> {
        let url = format!("{}{}", self.base, path);
        debug!(target: "sheetsync::git", "{} {} {}", operation, method, url);
        let mut req = self.client.request(method, &url);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().await.map_err(|e| GitError::Transport { operation, source: e })?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| GitError::Transport { operation, source: e })?;
        debug!(target: "sheetsync::git", "{} -> HTTP {} ({} bytes)", operation, status.as_u16(), text.len());
        if !status.is_success() {
            return Err(GitError::failure(operation, status.as_u16(), text));
        }
        Ok((status, text))
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GitResult<Value> {
        let (status, text) = self.send(operation, method, path, body).await?;
        serde_json::from_str(&text).map_err(|_| GitError::failure(operation, status.as_u16(), text))
    }

    async fn send_for<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GitResult<T> {
        let v = self.send_json(operation, method, path, body).await?;
        T::deserialize(&v).map_err(|e| GitError::MalformedResponse {
            operation,
            detail: e.to_string(),
            body: v.to_string(),
        })
    }
}

impl RepositoryObjectStore for GitObjectClient {
    async fn get_branch_tip(&self, branch: &str) -> GitResult<String> {
        let path = format!("/git/trees/{}", encode_path(branch));
        let body: ShaBody = self.send_for("get_branch_tip", Method::GET, &path, None::<&()>).await?;
        Ok(body.sha)
    }

    async fn create_branch(&self, name: &str, base_sha: &str) -> GitResult<String> {
        let req = NewRef { refname: format!("refs/heads/{}", name), sha: base_sha };
        match self.send_for::<RefBody, _>("create_branch", Method::POST, "/git/refs", Some(&req)).await {
            Ok(body) => Ok(body.object.sha),
            Err(GitError::RemoteRequestFailure { status: 422, body, .. }) if body.contains("already exists") => {
                Err(GitError::DuplicateBranch(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn create_blob(&self, content: &str) -> GitResult<String> {
        // The payload is stored as a JSON string literal, not as raw text.
        let encoded = serde_json::to_string(content)
            .map_err(|e| GitError::Encode { operation: "create_blob", source: e })?;
        let req = NewBlob { content: encoded, encoding: "utf-8" };
        let body: ShaBody = self.send_for("create_blob", Method::POST, "/git/blobs", Some(&req)).await?;
        Ok(body.sha)
    }

    async fn create_tree(&self, path: &str, blob_sha: &str, base_tree: &str) -> GitResult<String> {
        let req = NewTree {
            base_tree,
            tree: vec![TreeEntry { path, mode: FILE_MODE, kind: "blob", sha: blob_sha }],
        };
        let body: ShaBody = self.send_for("create_tree", Method::POST, "/git/trees", Some(&req)).await?;
        Ok(body.sha)
    }

    async fn create_commit(&self, message: &str, tree_sha: &str, parent_sha: &str) -> GitResult<String> {
        let req = NewCommit { message, tree: tree_sha, parents: [parent_sha] };
        let body: ShaBody = self.send_for("create_commit", Method::POST, "/git/commits", Some(&req)).await?;
        Ok(body.sha)
    }

    async fn update_branch_ref(&self, branch: &str, commit_sha: &str) -> GitResult<()> {
        let path = format!("/git/refs/heads/{}", encode_path(branch));
        self.send_json("update_branch_ref", Method::PATCH, &path, Some(&RefUpdate { sha: commit_sha })).await?;
        Ok(())
    }

    async fn dispatch_workflow(&self, workflow: &str, ref_name: &str, inputs: &Map<String, Value>) -> GitResult<()> {
        let path = format!("/actions/workflows/{}/dispatches", encode_path(workflow));
        let req = Dispatch { refname: ref_name, inputs };
        // 204 No Content on success; a body, if any, must still be JSON.
        let (status, text) = self.send("dispatch_workflow", Method::POST, &path, Some(&req)).await?;
        if !text.trim().is_empty() && serde_json::from_str::<Value>(&text).is_err() {
            return Err(GitError::failure("dispatch_workflow", status.as_u16(), text));
        }
        Ok(())
    }
}

/// Builds `GitObjectClient`s for the repository named in a `SyncConfig`.
#[derive(Debug, Clone)]
pub struct GitHubConnector {
    repo_url: String,
    api_version: String,
    user_agent: String,
}

impl GitHubConnector {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            repo_url: config.repo_url(),
            api_version: config.api_version.clone(),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl ConnectRepository for GitHubConnector {
    type Store = GitObjectClient;

    fn connect(&self, token: &str) -> GitResult<GitObjectClient> {
        GitObjectClient::new(&self.repo_url, token, &self.api_version, &self.user_agent)
    }
}
