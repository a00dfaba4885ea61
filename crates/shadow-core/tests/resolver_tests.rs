//! Workspace resolution against the in-memory host

use pretty_assertions::assert_eq;
use shadow_core::{MirrorSettings, ResolveError, WorkspaceResolver};
use shadow_fs::NormalizedPath;
use shadow_test_utils::{CreateBehavior, FakeRepository};
use tempfile::TempDir;

fn settings(temp: &TempDir) -> MirrorSettings {
    let target = temp.path().join("main");
    std::fs::create_dir_all(&target).unwrap();
    MirrorSettings {
        repository: "Proj".into(),
        stream: "/main".into(),
        target: NormalizedPath::new(target),
    }
}

#[test]
fn test_existing_workspace_is_returned_without_creation() {
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp);
    let repo = FakeRepository::new("Proj", &["/main"]);
    repo.add_workspace("other", temp.path().join("elsewhere"));
    repo.add_workspace("mirror", settings.target.clone());

    let resolver = WorkspaceResolver::new(&settings);
    let first = resolver.resolve(&*repo, true).unwrap();
    let second = resolver.resolve(&*repo, true).unwrap();

    assert_eq!(first.name(), "mirror");
    assert_eq!(second.name(), first.name());
    assert_eq!(second.path(), first.path());
    assert!(repo.creations().is_empty());
}

#[test]
fn test_first_match_wins() {
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp);
    let repo = FakeRepository::new("Proj", &["/main"]);
    repo.add_workspace("first", settings.target.clone());
    repo.add_workspace("second", settings.target.clone());

    let found = WorkspaceResolver::new(&settings).resolve(&*repo, false).unwrap();
    assert_eq!(found.name(), "first");
}

#[test]
fn test_missing_workspace_without_create_is_absent() {
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp);
    let repo = FakeRepository::new("Proj", &["/main"]);

    let found = WorkspaceResolver::new(&settings).resolve(&*repo, false);

    assert!(found.is_none());
    assert!(repo.creations().is_empty());
    assert_eq!(repo.enumerations(), 1);
}

#[test]
fn test_missing_workspace_is_created_then_looked_up() {
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp);
    let repo = FakeRepository::new("Proj", &["/main"]);

    let resolver = WorkspaceResolver::new(&settings);
    let created = resolver.resolve(&*repo, true).unwrap();
    assert_eq!(repo.creations().len(), 1);
    assert_eq!(repo.enumerations(), 2);

    let again = resolver.resolve(&*repo, true).unwrap();
    assert_eq!(again.name(), created.name());
    assert_eq!(repo.creations().len(), 1);
    assert_eq!(repo.workspace_count(), 1);
}

#[test]
fn test_creation_refused() {
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp);
    let repo = FakeRepository::new("Proj", &["/main"]);
    repo.set_create_behavior(CreateBehavior::Refuse);

    let resolver = WorkspaceResolver::new(&settings);
    let err = resolver.try_resolve(&*repo, true).err().unwrap();
    assert!(matches!(err, ResolveError::CreationFailed { .. }));

    assert!(resolver.resolve(&*repo, true).is_none());
    assert_eq!(repo.updates(), 0);
}

#[test]
fn test_created_workspace_not_found_is_inconsistency() {
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp);
    let repo = FakeRepository::new("Proj", &["/main"]);
    repo.set_create_behavior(CreateBehavior::Vanish);

    let err = WorkspaceResolver::new(&settings)
        .try_resolve(&*repo, true)
        .err()
        .unwrap();

    assert!(matches!(err, ResolveError::LookupInconsistency { .. }));
    assert_eq!(repo.creations().len(), 1);
    assert_eq!(repo.enumerations(), 2);
}

#[test]
fn test_stream_gone_before_creation() {
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp);
    let repo = FakeRepository::new("Proj", &["/dev"]);

    let err = WorkspaceResolver::new(&settings)
        .try_resolve(&*repo, true)
        .err()
        .unwrap();

    assert!(matches!(err, ResolveError::StreamNotFound { ref stream, .. } if stream == "/main"));
    assert!(repo.creations().is_empty());
}

#[test]
fn test_enumeration_failure() {
    let temp = TempDir::new().unwrap();
    let settings = settings(&temp);
    let repo = FakeRepository::new("Proj", &["/main"]);
    repo.fail_enumeration(true);

    let err = WorkspaceResolver::new(&settings)
        .try_resolve(&*repo, true)
        .err()
        .unwrap();

    assert!(matches!(err, ResolveError::Enumeration { .. }));
    assert!(repo.creations().is_empty());
}
