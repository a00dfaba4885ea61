//! Workspace and branch naming

use crate::WORKSPACE_BRANCH_PREFIX;

/// Name for a workspace created without an explicit name.
///
/// `/release/1.0` -> `shadow-release-1-0-1a2b3c4d`
pub fn generated_workspace_name(stream: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let slug = slugify(stream);
    if slug.is_empty() {
        format!("shadow-{}", &suffix[..8])
    } else {
        format!("shadow-{}-{}", slug, &suffix[..8])
    }
}

/// Branch a workspace keeps checked out.
pub fn workspace_branch(workspace: &str) -> String {
    format!("{}{}", WORKSPACE_BRANCH_PREFIX, workspace)
}

/// Convert a name to a flat slug usable as a worktree name.
/// `feat/user-auth` -> `feat-user-auth`
pub fn slugify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut last_was_dash = true; // Start true to skip leading dashes

    for c in name.chars() {
        if c.is_alphanumeric() {
            result.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            // Everything else, including '/', '.', '_' and '-', collapses to one dash
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}
