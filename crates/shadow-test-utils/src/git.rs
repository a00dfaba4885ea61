//! Git repository fixtures.
//!
//! Served repositories are bare, the way a central server keeps them.
//! Everything is built through `git2`, so no `git` binary is needed.

use std::path::Path;

use git2::{Oid, Repository, Signature};

fn signature() -> Signature<'static> {
    Signature::now("Test User", "test@test.com")
        .unwrap_or_else(|e| panic!("signature: failed to build signature: {e}"))
}

/// Initialises a bare repository at `<root>/<name>.git` with one commit
/// on `branch`, which also becomes HEAD.
///
/// # Panics
/// Panics if any git operation fails.
pub fn bare_repo_with_branch(root: &Path, name: &str, branch: &str) -> Repository {
    let path = root.join(format!("{name}.git"));
    let repo = Repository::init_bare(&path).unwrap_or_else(|e| {
        panic!(
            "bare_repo_with_branch: failed to init repository at {}: {e}",
            path.display()
        )
    });

    commit_file(&repo, branch, "README.md", "# Test");
    repo.set_head(&format!("refs/heads/{branch}"))
        .unwrap_or_else(|e| panic!("bare_repo_with_branch: failed to set HEAD: {e}"));
    repo
}

/// Commits `file` with `content` on top of `branch`, creating the branch
/// if it does not exist. Only top-level files are supported.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_file(repo: &Repository, branch: &str, file: &str, content: &str) -> Oid {
    let refname = format!("refs/heads/{branch}");
    let parent = repo
        .find_reference(&refname)
        .ok()
        .and_then(|r| r.peel_to_commit().ok());
    let parent_tree = parent.as_ref().map(|c| {
        c.tree()
            .unwrap_or_else(|e| panic!("commit_file: failed to read parent tree: {e}"))
    });

    let blob = repo
        .blob(content.as_bytes())
        .unwrap_or_else(|e| panic!("commit_file: failed to write blob: {e}"));
    let mut builder = repo
        .treebuilder(parent_tree.as_ref())
        .unwrap_or_else(|e| panic!("commit_file: failed to create tree builder: {e}"));
    builder
        .insert(file, blob, 0o100644)
        .unwrap_or_else(|e| panic!("commit_file: failed to insert {file}: {e}"));
    let tree_id = builder
        .write()
        .unwrap_or_else(|e| panic!("commit_file: failed to write tree: {e}"));
    let tree = repo
        .find_tree(tree_id)
        .unwrap_or_else(|e| panic!("commit_file: failed to find tree: {e}"));

    let sig = signature();
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(
        Some(&refname),
        &sig,
        &sig,
        &format!("Update {file}"),
        &tree,
        &parents,
    )
    .unwrap_or_else(|e| panic!("commit_file: failed to commit on {branch}: {e}"))
}

/// Creates `branch` pointing at the tip of `from`.
///
/// # Panics
/// Panics if `from` does not exist or the branch cannot be created.
pub fn create_branch(repo: &Repository, branch: &str, from: &str) -> Oid {
    let tip = repo
        .find_reference(&format!("refs/heads/{from}"))
        .and_then(|r| r.peel_to_commit())
        .unwrap_or_else(|e| panic!("create_branch: branch {from} not found: {e}"));
    repo.branch(branch, &tip, false)
        .unwrap_or_else(|e| panic!("create_branch: failed to create {branch}: {e}"));
    tip.id()
}
