use super::*;

#[test]
fn exit_code_mapping() {
    assert_eq!(SyncError::SheetNotFound("master".into()).exit_code(), 3);
    assert_eq!(SyncError::CredentialMissing("GITHUB_PAT".into()).exit_code(), 3);
    assert_eq!(SyncError::Config("bad".into()).exit_code(), 2);
    assert_eq!(SyncError::Workbook(WorkbookError::InvalidRange("x".into())).exit_code(), 4);
    let p = CommitProgress::default();
    assert_eq!(SyncError::remote(SyncStep::CreateBlob, &p, GitError::failure("create_blob", 500, "")).exit_code(), 5);
    assert_eq!(SyncError::remote(SyncStep::CreateBranch, &p, GitError::DuplicateBranch("b".into())).exit_code(), 6);
}

#[test]
fn code_strings() {
    let p = CommitProgress::default();
    assert_eq!(SyncError::SheetNotFound("master".into()).code_str(), "sheet_not_found");
    assert_eq!(
        SyncError::remote(SyncStep::CreateBranch, &p, GitError::DuplicateBranch("b".into())).code_str(),
        "duplicate_branch"
    );
    assert_eq!(
        SyncError::remote(SyncStep::CreateTree, &p, GitError::failure("create_tree", 404, "{}")).code_str(),
        "remote_request_failure"
    );
}

#[test]
fn remote_error_carries_step_and_progress() {
    let p = CommitProgress { tip: Some("s1".into()), branch: Some("s2".into()), ..Default::default() };
    let e = SyncError::remote(SyncStep::CreateBlob, &p, GitError::failure("create_blob", 502, "bad gateway"));
    assert_eq!(e.step(), Some(SyncStep::CreateBlob));
    assert!(e.progress().unwrap().branch_created());
    assert_eq!(e.to_string(), "create_blob failed: create_blob: remote request failed with HTTP 502: bad gateway");
}

#[test]
fn sheet_not_found_message() {
    assert_eq!(SyncError::SheetNotFound("master".into()).to_string(), "sheet 'master' is not found");
}

#[test]
fn export_write_failure_is_an_output_error() {
    let e = SyncError::Output {
        path: PathBuf::from("/ro/data.json"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
    };
    assert_eq!(e.code_str(), "output_error");
    assert_eq!(e.exit_code(), 7);
    assert_eq!(e.to_string(), "cannot write /ro/data.json: read-only");
    assert!(e.step().is_none());
}
