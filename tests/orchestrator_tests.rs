//! Sync flow tests against a recording in-memory repository.
//! Each store call is logged so the tests can check order and sha threading.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use sheetsync::git::{ConnectRepository, GitError, GitResult, RepositoryObjectStore};
use sheetsync::sheet::{Grid, MemoryWorkbook};
use sheetsync::{SyncConfig, SyncError, SyncOrchestrator, SyncStep};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Tip(String),
    Branch(String, String),
    Blob(String),
    Tree(String, String, String),
    Commit(String, String, String),
    Update(String, String),
    Dispatch(String, String, Map<String, Value>),
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    tokens: Arc<Mutex<Vec<String>>>,
    fail_at: Option<&'static str>,
}

impl Recorder {
    fn failing(op: &'static str) -> Self {
        Self { fail_at: Some(op), ..Default::default() }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn step(&self, op: &'static str, call: Call, sha: &str) -> GitResult<String> {
        self.calls.lock().push(call);
        if self.fail_at == Some(op) {
            if op == "create_branch" {
                return Err(GitError::DuplicateBranch("sheetsync/update-json".into()));
            }
            return Err(GitError::failure(op, 500, r#"{"message":"boom"}"#));
        }
        Ok(sha.to_string())
    }
}

impl RepositoryObjectStore for Recorder {
    async fn get_branch_tip(&self, branch: &str) -> GitResult<String> {
        self.step("get_branch_tip", Call::Tip(branch.into()), "s1")
    }

    async fn create_branch(&self, name: &str, base_sha: &str) -> GitResult<String> {
        self.step("create_branch", Call::Branch(name.into(), base_sha.into()), "s2")
    }

    async fn create_blob(&self, content: &str) -> GitResult<String> {
        self.step("create_blob", Call::Blob(content.into()), "s3")
    }

    async fn create_tree(&self, path: &str, blob_sha: &str, base_tree: &str) -> GitResult<String> {
        self.step("create_tree", Call::Tree(path.into(), blob_sha.into(), base_tree.into()), "s4")
    }

    async fn create_commit(&self, message: &str, tree_sha: &str, parent_sha: &str) -> GitResult<String> {
        self.step("create_commit", Call::Commit(message.into(), tree_sha.into(), parent_sha.into()), "s5")
    }

    async fn update_branch_ref(&self, branch: &str, commit_sha: &str) -> GitResult<()> {
        self.step("update_branch_ref", Call::Update(branch.into(), commit_sha.into()), "")
            .map(|_| ())
    }

    async fn dispatch_workflow(&self, workflow: &str, ref_name: &str, inputs: &Map<String, Value>) -> GitResult<()> {
        self.step("dispatch_workflow", Call::Dispatch(workflow.into(), ref_name.into(), inputs.clone()), "")
            .map(|_| ())
    }
}

struct RecorderConnector(Recorder);

impl ConnectRepository for RecorderConnector {
    type Store = Recorder;

    fn connect(&self, token: &str) -> GitResult<Recorder> {
        self.0.tokens.lock().push(token.to_string());
        Ok(self.0.clone())
    }
}

fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
}

fn people() -> Grid {
    grid(&[
        &["id", "name", "team"],
        &["1", "Alice", "core"],
        &["2", "Bob", "infra"],
        &["", "ignored", ""],
        &["3", "Carol", "core"],
    ])
}

const PEOPLE_JSON: &str = r#"[{"id":"1","name":"Alice","team":"core"},{"id":"2","name":"Bob","team":"infra"}]"#;

fn token() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("GITHUB_PAT".to_string(), "ghp_test".to_string());
    m
}

fn orchestrator(
    rec: &Recorder,
    creds: HashMap<String, String>,
) -> SyncOrchestrator<MemoryWorkbook, HashMap<String, String>, RecorderConnector> {
    let config = SyncConfig { owner: "acme".into(), repo: "data".into(), ..Default::default() };
    let wb = MemoryWorkbook::new().with_sheet("master", people());
    SyncOrchestrator::new(config, wb, creds, RecorderConnector(rec.clone()))
}

#[tokio::test]
async fn commit_flow_runs_steps_in_order_threading_shas() {
    let rec = Recorder::default();
    let outcome = orchestrator(&rec, token()).commit().await.expect("commit flow");

    assert_eq!(
        rec.calls(),
        vec![
            Call::Tip("main".into()),
            Call::Branch("sheetsync/update-json".into(), "s1".into()),
            Call::Blob(PEOPLE_JSON.into()),
            // tree and commit build on the branch sha, not the tip sha
            Call::Tree("data.json".into(), "s3".into(), "s2".into()),
            Call::Commit("Sync json".into(), "s4".into(), "s2".into()),
            Call::Update("sheetsync/update-json".into(), "s5".into()),
        ]
    );
    assert_eq!(outcome.commit_sha, "s5");
    assert_eq!(outcome.records, 2);
    assert_eq!(outcome.branch, "sheetsync/update-json");
    assert_eq!(*rec.tokens.lock(), vec!["ghp_test".to_string()]);
}

#[tokio::test]
async fn blob_failure_stops_before_tree_commit_and_ref() {
    let rec = Recorder::failing("create_blob");
    let err = orchestrator(&rec, token()).commit().await.unwrap_err();

    assert_eq!(err.step(), Some(SyncStep::CreateBlob));
    let progress = err.progress().unwrap();
    assert_eq!(progress.tip.as_deref(), Some("s1"));
    assert_eq!(progress.branch.as_deref(), Some("s2"));
    assert!(progress.blob.is_none());

    let calls = rec.calls();
    assert_eq!(calls.len(), 3);
    assert!(!calls.iter().any(|c| matches!(c, Call::Tree(..) | Call::Commit(..) | Call::Update(..))));
}

#[tokio::test]
async fn existing_branch_is_a_hard_failure() {
    let rec = Recorder::failing("create_branch");
    let err = orchestrator(&rec, token()).commit().await.unwrap_err();

    assert_eq!(err.code_str(), "duplicate_branch");
    assert_eq!(err.step(), Some(SyncStep::CreateBranch));
    assert!(!err.progress().unwrap().branch_created());
    assert_eq!(rec.calls().len(), 2);
}

#[tokio::test]
async fn failing_ref_update_reports_created_commit() {
    let rec = Recorder::failing("update_branch_ref");
    let err = orchestrator(&rec, token()).commit().await.unwrap_err();
    assert_eq!(err.step(), Some(SyncStep::UpdateBranchRef));
    assert_eq!(err.progress().unwrap().commit.as_deref(), Some("s5"));
    assert_eq!(rec.calls().len(), 6);
}

#[tokio::test]
async fn missing_sheet_aborts_before_any_remote_call() {
    let rec = Recorder::default();
    let config = SyncConfig { sheet_name: "absent".into(), ..Default::default() };
    let orch = SyncOrchestrator::new(
        config,
        MemoryWorkbook::new().with_sheet("master", people()),
        token(),
        RecorderConnector(rec.clone()),
    );
    let err = orch.commit().await.unwrap_err();
    assert!(matches!(err, SyncError::SheetNotFound(ref n) if n == "absent"));
    assert!(rec.calls().is_empty());
    assert!(rec.tokens.lock().is_empty());
}

#[tokio::test]
async fn missing_credential_aborts_before_any_remote_call() {
    let rec = Recorder::default();
    let err = orchestrator(&rec, HashMap::new()).dispatch().await.unwrap_err();
    assert!(matches!(err, SyncError::CredentialMissing(ref n) if n == "GITHUB_PAT"));
    assert!(rec.calls().is_empty());
}

#[tokio::test]
async fn dispatch_flow_sends_json_input_on_main() {
    let rec = Recorder::default();
    orchestrator(&rec, token()).dispatch().await.expect("dispatch flow");

    let mut inputs = Map::new();
    inputs.insert("json".into(), Value::String(PEOPLE_JSON.into()));
    assert_eq!(rec.calls(), vec![Call::Dispatch("sync.yml".into(), "main".into(), inputs)]);
}

#[tokio::test]
async fn dispatch_failure_is_typed() {
    let rec = Recorder::failing("dispatch_workflow");
    let err = orchestrator(&rec, token()).dispatch().await.unwrap_err();
    assert_eq!(err.step(), Some(SyncStep::DispatchWorkflow));
    assert_eq!(err.code_str(), "remote_request_failure");
}

#[test]
fn download_json_needs_no_credentials() {
    let rec = Recorder::default();
    let json = orchestrator(&rec, HashMap::new()).generate_for_download().unwrap();
    assert_eq!(json, PEOPLE_JSON);
    assert!(rec.calls().is_empty());
}

#[test]
fn configured_column_range_limits_fields() {
    let rec = Recorder::default();
    let config = SyncConfig { columns: "A:B".into(), ..Default::default() };
    let orch = SyncOrchestrator::new(
        config,
        MemoryWorkbook::new().with_sheet("master", people()),
        token(),
        RecorderConnector(rec),
    );
    assert_eq!(
        orch.generate_for_download().unwrap(),
        r#"[{"id":"1","name":"Alice"},{"id":"2","name":"Bob"}]"#
    );
}
