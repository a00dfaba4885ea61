//! Git server: repository directory, event delivery and ref polling

use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use git2::Oid;
use shadow_core::{
    ChangeSubmittedEvent, Connection, EventHandler, Repository, StreamCreatedEvent,
};
use shadow_fs::NormalizedPath;

use crate::hook::parse_post_receive;
use crate::repository::GitRepository;
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Events delivered by one [`GitServer::poll`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub streams_created: usize,
    pub changes_submitted: usize,
    /// Whether the poll found nothing and delivered an idle callback.
    pub idle: bool,
}

/// Serves every git repository directly under a root directory.
///
/// Repository names are directory names without a `.git` suffix and are
/// looked up case-insensitively.
pub struct GitServer {
    root: NormalizedPath,
    data_dir: NormalizedPath,
    handlers: Mutex<Vec<Arc<dyn EventHandler>>>,
    repositories: Mutex<HashMap<String, Arc<GitRepository>>>,
    snapshots: Mutex<HashMap<String, HashMap<String, Oid>>>,
}

impl GitServer {
    pub fn new(root: NormalizedPath, data_dir: NormalizedPath) -> Self {
        Self {
            root,
            data_dir,
            handlers: Mutex::new(Vec::new()),
            repositories: Mutex::new(HashMap::new()),
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Number of registered event handlers.
    pub fn handler_count(&self) -> usize {
        lock(&self.handlers).len()
    }

    /// All repositories currently under the root, sorted by name.
    ///
    /// Handles are kept while the repository exists so its stream cache
    /// survives between lookups. Repositories gone from the root are
    /// dropped.
    pub fn repositories(&self) -> Result<Vec<Arc<GitRepository>>> {
        let root = self.root.to_native();
        let entries = fs::read_dir(&root).map_err(|e| shadow_fs::Error::io(&root, e))?;

        let mut cache = lock(&self.repositories);
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| shadow_fs::Error::io(&root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let name = file_name
                .strip_suffix(".git")
                .unwrap_or(&file_name)
                .to_string();

            let key = name.to_lowercase();
            if let Some(existing) = cache.get(&key) {
                seen.insert(key);
                result.push(existing.clone());
                continue;
            }
            if git2::Repository::open(&path).is_err() {
                tracing::debug!(path = %path.display(), "Skipping non-repository directory");
                continue;
            }

            let repository = Arc::new(GitRepository::new(name, path));
            seen.insert(key.clone());
            cache.insert(key, repository.clone());
            result.push(repository);
        }

        cache.retain(|key, _| seen.contains(key));
        result.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(result)
    }

    /// Look up a repository, reporting failures as errors.
    pub fn repository(&self, name: &str) -> Result<Arc<GitRepository>> {
        self.repositories()?
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::RepositoryNotFound {
                name: name.to_string(),
            })
    }

    fn handlers(&self) -> Vec<Arc<dyn EventHandler>> {
        lock(&self.handlers).clone()
    }

    /// Deliver an idle callback to every handler.
    pub fn idle(&self) {
        for handler in self.handlers() {
            handler.on_idle();
        }
    }

    fn stream_created(&self, repository: &Arc<GitRepository>) {
        let repository: Arc<dyn Repository> = repository.clone();
        let event = StreamCreatedEvent {
            repository: Some(repository),
        };
        for handler in self.handlers() {
            handler.on_stream_created(&event);
        }
    }

    fn change_submitted(&self, repository: &Arc<GitRepository>, branch: &str) {
        let stream = repository.stream_for_branch(branch);
        let repository: Arc<dyn Repository> = repository.clone();
        let event = ChangeSubmittedEvent {
            repository: Some(repository),
            stream: Some(stream),
        };
        for handler in self.handlers() {
            handler.on_change_submitted(&event);
        }
    }

    /// Compare branch tips with the previous poll and deliver events.
    ///
    /// New branches produce stream-created events, moved branches
    /// change-submitted events. A repository seen for the first time only
    /// records its tips, and tips of repositories gone from the root are
    /// forgotten. When nothing happened every handler gets an idle
    /// callback.
    pub fn poll(&self) -> Result<PollReport> {
        let mut report = PollReport::default();
        let repositories = self.repositories()?;

        let present: HashSet<String> = repositories
            .iter()
            .map(|r| r.name().to_lowercase())
            .collect();
        lock(&self.snapshots).retain(|key, _| present.contains(key));

        for repository in repositories {
            let tips = match repository.branch_tips() {
                Ok(tips) => tips.into_iter().collect::<HashMap<_, _>>(),
                Err(e) => {
                    tracing::warn!(repository = %repository.name(), error = %e, "Failed to read branches");
                    continue;
                }
            };

            let previous = lock(&self.snapshots).insert(repository.name().to_lowercase(), tips.clone());
            let Some(previous) = previous else {
                continue;
            };

            let mut created: Vec<&String> =
                tips.keys().filter(|b| !previous.contains_key(*b)).collect();
            created.sort();
            if !created.is_empty() {
                tracing::info!(repository = %repository.name(), streams = ?created, "Streams created");
                self.stream_created(&repository);
                report.streams_created += created.len();
            }

            let mut changed: Vec<&String> = tips
                .iter()
                .filter(|(branch, tip)| previous.get(*branch).is_some_and(|old| old != *tip))
                .map(|(branch, _)| branch)
                .collect();
            changed.sort();
            for branch in changed {
                self.change_submitted(&repository, branch);
                report.changes_submitted += 1;
            }
        }

        if report.streams_created == 0 && report.changes_submitted == 0 {
            self.idle();
            report.idle = true;
        }

        Ok(report)
    }

    /// Deliver events for git `post-receive` input pushed to `repository`.
    ///
    /// Deleted refs and refs outside `refs/heads/` are skipped. A created
    /// branch produces a stream-created event followed by a
    /// change-submitted event. Returns the number of change-submitted
    /// events delivered.
    pub fn dispatch_post_receive(&self, repository: &str, input: &str) -> Result<usize> {
        let repository = self.repository(repository)?;
        let updates = parse_post_receive(input)?;
        let mut delivered = 0;

        for update in &updates {
            let Some(branch) = update.branch() else {
                tracing::debug!(refname = %update.refname, "Skipping non-stream ref");
                continue;
            };
            if update.is_delete() {
                tracing::debug!(branch, "Skipping deleted stream");
                continue;
            }
            if update.is_create() {
                self.stream_created(&repository);
            }
            self.change_submitted(&repository, branch);
            delivered += 1;
        }

        Ok(delivered)
    }
}

impl Connection for GitServer {
    fn repository_by_name(&self, name: &str) -> Option<Arc<dyn Repository>> {
        match self.repository(name) {
            Ok(repository) => Some(repository as Arc<dyn Repository>),
            Err(e) => {
                tracing::debug!(name, error = %e, "Repository lookup failed");
                None
            }
        }
    }

    fn data_directory(&self) -> NormalizedPath {
        self.data_dir.clone()
    }

    fn register(&self, handler: Arc<dyn EventHandler>) {
        lock(&self.handlers).push(handler);
    }
}
