//! End-to-end: a mirror controller running against the git server

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use shadow_core::{
    Connection, Dispatch, MirrorConfig, MirrorController, Phase, Repository, ResolveError,
    ReturnCode, SyncOutcome, Workspace, WorkspaceOptions, WorkspaceResolver, WorkspaceSpec,
};
use shadow_fs::NormalizedPath;
use shadow_git::{GitServer, GitStream};
use shadow_test_utils::git::{bare_repo_with_branch, commit_file, create_branch};
use tempfile::TempDir;

struct Fixture {
    temp: TempDir,
    server: GitServer,
    repo: git2::Repository,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("served");
        fs::create_dir(&root).unwrap();
        let repo = bare_repo_with_branch(&root, "Proj", "main");
        let server = GitServer::new(
            NormalizedPath::new(&root),
            NormalizedPath::new(temp.path().join("data")),
        );
        Self { temp, server, repo }
    }

    fn start(&self, stream: &str) -> Arc<MirrorController> {
        MirrorController::start(&MirrorConfig::new("Proj", stream), &self.server).unwrap()
    }

    fn mirror(&self, stream: &str) -> std::path::PathBuf {
        self.temp.path().join("data").join(stream.trim_start_matches('/'))
    }
}

#[test]
fn test_idle_creates_and_populates_shadow_folder() {
    let fx = Fixture::new();
    let controller = fx.start("/main");
    assert!(fx.mirror("main").is_dir());

    fx.server.idle();

    assert_eq!(controller.phase(), Phase::Steady);
    assert_eq!(
        fs::read_to_string(fx.mirror("main").join("README.md")).unwrap(),
        "# Test"
    );
    let repository = fx.server.repository_by_name("Proj").unwrap();
    assert_eq!(repository.workspaces().unwrap().len(), 1);
}

#[test]
fn test_submitted_change_reaches_shadow_folder() {
    let fx = Fixture::new();
    let _controller = fx.start("/main");
    fx.server.idle();

    let old = fx.repo.refname_to_id("refs/heads/main").unwrap();
    let new = commit_file(&fx.repo, "main", "NEW.md", "fresh content");
    fx.server
        .dispatch_post_receive("Proj", &format!("{old} {new} refs/heads/main"))
        .unwrap();

    assert_eq!(
        fs::read_to_string(fx.mirror("main").join("NEW.md")).unwrap(),
        "fresh content"
    );
}

#[test]
fn test_polling_drives_the_mirror() {
    let fx = Fixture::new();
    let _controller = fx.start("/main");

    fx.server.poll().unwrap();
    assert!(fx.mirror("main").join("README.md").is_file());

    commit_file(&fx.repo, "main", "README.md", "# Updated");
    let report = fx.server.poll().unwrap();

    assert_eq!(report.changes_submitted, 1);
    assert_eq!(
        fs::read_to_string(fx.mirror("main").join("README.md")).unwrap(),
        "# Updated"
    );
}

#[test]
fn test_change_on_other_stream_leaves_mirror_alone() {
    let fx = Fixture::new();
    create_branch(&fx.repo, "dev", "main");
    let controller = fx.start("/main");
    controller.idle();

    commit_file(&fx.repo, "dev", "DEV.md", "dev only");
    let repository = fx.server.repository_by_name("Proj").unwrap();
    let event = shadow_core::ChangeSubmittedEvent {
        repository: Some(repository.clone()),
        stream: repository.stream_by_path("/dev"),
    };

    assert_eq!(controller.change_submitted(&event), Dispatch::Ignored);
    assert!(!fx.mirror("main").join("DEV.md").exists());
}

#[test]
fn test_restart_reuses_existing_workspace() {
    let fx = Fixture::new();
    fx.start("/main").idle();

    let server = GitServer::new(
        fx.server.root().clone(),
        NormalizedPath::new(fx.temp.path().join("data")),
    );
    let controller = MirrorController::start(&MirrorConfig::new("Proj", "/main"), &server).unwrap();

    assert_eq!(controller.idle(), Dispatch::Synchronized(SyncOutcome::Success));
    let repository = server.repository_by_name("Proj").unwrap();
    assert_eq!(repository.workspaces().unwrap().len(), 1);
}

#[test]
fn test_local_edits_are_overwritten_with_soft_failure() {
    let fx = Fixture::new();
    let controller = fx.start("/main");
    controller.idle();
    fs::write(fx.mirror("main").join("README.md"), "local edit").unwrap();

    commit_file(&fx.repo, "main", "NEW.md", "new");
    let repository = fx.server.repository_by_name("Proj").unwrap();
    let event = shadow_core::ChangeSubmittedEvent {
        repository: Some(repository.clone()),
        stream: repository.stream_by_path("/main"),
    };

    assert_eq!(
        controller.change_submitted(&event),
        Dispatch::Synchronized(SyncOutcome::SoftFailure(
            ReturnCode::LocalChangesOverwritten
        ))
    );
    assert_eq!(
        fs::read_to_string(fx.mirror("main").join("README.md")).unwrap(),
        "# Test"
    );
}

#[test]
fn test_deleted_stream_is_hard_failure() {
    let fx = Fixture::new();
    create_branch(&fx.repo, "dev", "main");
    let controller = fx.start("/dev");
    controller.idle();

    fx.repo
        .find_branch("dev", git2::BranchType::Local)
        .unwrap()
        .delete()
        .unwrap();

    let repository = fx.server.repository_by_name("Proj").unwrap();
    let workspaces = repository.workspaces().unwrap();
    let outcome = shadow_core::synchronize(workspaces[0].as_ref());

    assert_eq!(outcome, SyncOutcome::HardFailure(ReturnCode::StreamNotFound));
}

#[test]
fn test_non_empty_target_refuses_creation() {
    let fx = Fixture::new();
    let target = fx.temp.path().join("occupied");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep.txt"), "precious").unwrap();

    let config = MirrorConfig::new("Proj", "/main").with_path(target.to_string_lossy());
    let controller = MirrorController::start(&config, &fx.server).unwrap();

    let repository = fx.server.repository_by_name("Proj").unwrap();
    let err = WorkspaceResolver::new(controller.settings())
        .try_resolve(repository.as_ref(), true)
        .err()
        .unwrap();
    assert!(matches!(err, ResolveError::CreationFailed { .. }));

    assert_eq!(controller.idle(), Dispatch::NotAttempted);
    assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "precious");
}

#[test]
fn test_created_worktree_tracks_stream() {
    let fx = Fixture::new();
    let stream = GitStream::new("main", fx.repo.path().to_path_buf());
    let target = NormalizedPath::new(fx.temp.path().join("explicit"));

    let name = stream
        .create(&WorkspaceSpec {
            name: "Nightly Mirror".into(),
            path: target.clone(),
            description: "'/main' Shadow Folder".into(),
            options: WorkspaceOptions {
                exclusive: true,
                ..WorkspaceOptions::mirror()
            },
        })
        .unwrap();

    assert_eq!(name, "Nightly-Mirror");
    let branch = fx
        .repo
        .find_branch("shadow/Nightly-Mirror", git2::BranchType::Local)
        .unwrap();
    assert_eq!(branch.upstream().unwrap().name().unwrap(), Some("main"));

    let description = fx
        .repo
        .config()
        .unwrap()
        .get_string("branch.shadow/Nightly-Mirror.description")
        .unwrap();
    assert_eq!(description, "'/main' Shadow Folder");

    let worktree = fx.repo.find_worktree("Nightly-Mirror").unwrap();
    assert!(matches!(
        worktree.is_locked().unwrap(),
        git2::WorktreeLockStatus::Locked(_)
    ));

    let repository = fx.server.repository_by_name("Proj").unwrap();
    let workspaces = repository.workspaces().unwrap();
    assert_eq!(workspaces.len(), 1);
    assert!(workspaces[0].manages_path(&target));
}

#[test]
fn test_workspace_branches_are_not_streams() {
    let fx = Fixture::new();
    fx.start("/main").idle();

    let repository = fx.server.repository_by_name("Proj").unwrap();
    repository.refresh_streams();

    let tips = fx.server.repository("Proj").unwrap().branch_tips().unwrap();
    let names: Vec<&str> = tips.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["main"]);
    assert!(repository.stream_by_path("/shadow").is_none());
}
