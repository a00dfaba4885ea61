//! Event dispatch: idle priming, change filtering, stream refresh

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use shadow_core::{
    ChangeSubmittedEvent, Dispatch, MirrorConfig, MirrorController, Phase, ReturnCode,
    SyncOutcome, WorkspaceOptions,
};
use shadow_test_utils::{FakeConnection, FakeRepository};
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    repo: Arc<FakeRepository>,
    conn: FakeConnection,
    controller: Arc<MirrorController>,
}

fn started() -> Fixture {
    let temp = TempDir::new().unwrap();
    let repo = FakeRepository::new("Proj", &["/main", "/dev"]);
    let conn = FakeConnection::new(temp.path()).with_repository(repo.clone());
    let controller = MirrorController::start(&MirrorConfig::new("Proj", "/main"), &conn).unwrap();
    Fixture {
        _temp: temp,
        repo,
        conn,
        controller,
    }
}

#[test]
fn test_first_idle_creates_workspace_and_updates() {
    let fx = started();

    let dispatch = fx.controller.idle();

    assert_eq!(dispatch, Dispatch::Synchronized(SyncOutcome::Success));
    let creations = fx.repo.creations();
    assert_eq!(creations.len(), 1);
    assert_eq!(creations[0].name, "");
    assert_eq!(creations[0].path, fx.controller.settings().target);
    assert_eq!(creations[0].description, "'/main' Shadow Folder");
    assert_eq!(creations[0].options, WorkspaceOptions::mirror());
    assert_eq!(fx.repo.updates(), 1);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(10)]
fn test_idle_synchronizes_exactly_once(#[case] ticks: usize) {
    let fx = started();

    for _ in 0..ticks {
        fx.conn.idle();
    }

    assert_eq!(fx.repo.updates(), 1);
    assert_eq!(fx.repo.creations().len(), 1);
    assert_eq!(fx.controller.phase(), Phase::Steady);
}

#[test]
fn test_idle_after_priming_is_skipped() {
    let fx = started();
    fx.controller.idle();

    assert_eq!(fx.controller.idle(), Dispatch::Skipped);
    assert_eq!(fx.repo.enumerations(), 2);
}

#[test]
fn test_idle_moves_to_steady_even_when_resolution_fails() {
    let fx = started();
    fx.repo.fail_enumeration(true);

    assert_eq!(fx.controller.idle(), Dispatch::NotAttempted);
    assert_eq!(fx.controller.phase(), Phase::Steady);

    fx.repo.fail_enumeration(false);
    assert_eq!(fx.controller.idle(), Dispatch::Skipped);
    assert_eq!(fx.repo.updates(), 0);
}

#[rstest]
#[case("Proj", "/main")]
#[case("proj", "/MAIN")]
#[case("PROJ", "/Main")]
fn test_matching_change_triggers_one_sync(#[case] repository: &str, #[case] stream: &str) {
    let fx = started();
    let repo = FakeRepository::new(repository, &["/main"]);
    repo.add_workspace("mirror", fx.controller.settings().target.clone());

    let dispatch = fx.controller.change_submitted(&repo.change_event(stream));

    assert_eq!(dispatch, Dispatch::Synchronized(SyncOutcome::Success));
    assert_eq!(repo.updates(), 1);
    assert!(repo.creations().is_empty());
}

#[test]
fn test_change_in_other_repository_is_ignored() {
    let fx = started();
    let other = FakeRepository::new("Other", &["/main"]);

    let dispatch = fx.controller.change_submitted(&other.change_event("/main"));

    assert_eq!(dispatch, Dispatch::Ignored);
    assert_eq!(other.enumerations(), 0);
    assert_eq!(other.updates(), 0);
    assert_eq!(fx.repo.enumerations(), 0);
}

#[test]
fn test_change_in_other_stream_is_ignored() {
    let fx = started();

    let dispatch = fx.controller.change_submitted(&fx.repo.change_event("/dev"));

    assert_eq!(dispatch, Dispatch::Ignored);
    assert_eq!(fx.repo.enumerations(), 0);
    assert_eq!(fx.repo.updates(), 0);
}

#[test]
fn test_change_without_repository_is_malformed() {
    let fx = started();
    let event = ChangeSubmittedEvent {
        repository: None,
        stream: Some(fx.repo.stream("/main")),
    };

    assert_eq!(fx.controller.change_submitted(&event), Dispatch::Malformed);
    assert_eq!(fx.repo.enumerations(), 0);
}

#[test]
fn test_change_without_stream_is_malformed() {
    let fx = started();
    let mut event = fx.repo.change_event("/main");
    event.stream = None;

    assert_eq!(fx.controller.change_submitted(&event), Dispatch::Malformed);
    assert_eq!(fx.repo.enumerations(), 0);
}

#[test]
fn test_change_before_idle_does_not_consume_priming() {
    let fx = started();

    fx.conn.submit(&fx.repo.change_event("/main"));
    assert_eq!(fx.controller.phase(), Phase::Priming);

    fx.conn.idle();
    fx.conn.idle();
    assert_eq!(fx.repo.updates(), 2);
    assert_eq!(fx.repo.creations().len(), 1);
}

#[test]
fn test_every_matching_change_synchronizes() {
    let fx = started();
    fx.conn.idle();

    for _ in 0..3 {
        fx.conn.submit(&fx.repo.change_event("/main"));
    }

    assert_eq!(fx.repo.updates(), 4);
    assert_eq!(fx.repo.creations().len(), 1);
}

#[test]
fn test_stream_created_refreshes_repository() {
    let fx = started();

    assert_eq!(
        fx.controller.stream_created(&fx.repo.stream_created_event()),
        Dispatch::StreamsRefreshed
    );
    fx.conn.stream_created(&fx.repo.stream_created_event());

    assert_eq!(fx.repo.refreshes(), 2);
    assert_eq!(fx.repo.updates(), 0);
}

#[test]
fn test_stream_created_without_repository() {
    let fx = started();
    let event = shadow_core::StreamCreatedEvent::default();

    assert_eq!(fx.controller.stream_created(&event), Dispatch::Malformed);
}

#[test]
fn test_soft_failure_still_counts_as_synchronized() {
    let fx = started();
    fx.repo
        .set_update_behavior(shadow_test_utils::UpdateBehavior::Complete(
            ReturnCode::LocalChangesOverwritten,
        ));

    assert_eq!(
        fx.controller.idle(),
        Dispatch::Synchronized(SyncOutcome::SoftFailure(ReturnCode::LocalChangesOverwritten))
    );
}

#[test]
fn test_concurrent_idle_synchronizes_once() {
    let fx = started();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| fx.controller.idle());
        }
    });

    assert_eq!(fx.repo.updates(), 1);
    assert_eq!(fx.repo.creations().len(), 1);
}
