//! In-memory host that records what the mirror controller asks of it.
//!
//! Every repository keeps a call log (workspace creations, updates,
//! stream refreshes, workspace enumerations) and configurable behaviour
//! for creation and update, so tests can drive failure paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use shadow_core::{
    ChangeSubmittedEvent, Connection, Error, EventHandler, Repository, ReturnCode, Stream,
    StreamCreatedEvent, UpdateError, Workspace, WorkspaceSpec,
};
use shadow_fs::NormalizedPath;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn trim_stream(path: &str) -> String {
    path.trim_start_matches('/').to_lowercase()
}

/// How [`Stream::create_workspace`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBehavior {
    /// Register the workspace and report success.
    Register,
    /// Report failure.
    Refuse,
    /// Report success without registering anything.
    Vanish,
}

/// How [`Workspace::update_to_latest`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateBehavior {
    /// The update completes with this code.
    Complete(ReturnCode),
    /// The update cannot complete.
    Abort(ReturnCode),
}

#[derive(Debug)]
struct RepoState {
    streams: Mutex<Vec<String>>,
    workspaces: Mutex<Vec<(String, NormalizedPath)>>,
    create: Mutex<CreateBehavior>,
    update: Mutex<UpdateBehavior>,
    fail_enumeration: AtomicBool,
    creations: Mutex<Vec<WorkspaceSpec>>,
    updates: AtomicUsize,
    refreshes: AtomicUsize,
    enumerations: AtomicUsize,
}

/// A repository with streams and workspaces held in memory.
#[derive(Debug)]
pub struct FakeRepository {
    name: String,
    state: Arc<RepoState>,
}

impl FakeRepository {
    /// Create a repository with the given canonical stream paths.
    pub fn new(name: &str, streams: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            state: Arc::new(RepoState {
                streams: Mutex::new(streams.iter().map(|s| s.to_string()).collect()),
                workspaces: Mutex::new(Vec::new()),
                create: Mutex::new(CreateBehavior::Register),
                update: Mutex::new(UpdateBehavior::Complete(ReturnCode::Success)),
                fail_enumeration: AtomicBool::new(false),
                creations: Mutex::new(Vec::new()),
                updates: AtomicUsize::new(0),
                refreshes: AtomicUsize::new(0),
                enumerations: AtomicUsize::new(0),
            }),
        })
    }

    /// Register an existing workspace.
    pub fn add_workspace(&self, name: &str, path: impl Into<NormalizedPath>) {
        lock(&self.state.workspaces).push((name.to_string(), path.into()));
    }

    pub fn set_create_behavior(&self, behavior: CreateBehavior) {
        *lock(&self.state.create) = behavior;
    }

    pub fn set_update_behavior(&self, behavior: UpdateBehavior) {
        *lock(&self.state.update) = behavior;
    }

    /// Make [`Repository::workspaces`] fail.
    pub fn fail_enumeration(&self, fail: bool) {
        self.state.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    /// Every spec passed to `create_workspace`, in call order.
    pub fn creations(&self) -> Vec<WorkspaceSpec> {
        lock(&self.state.creations).clone()
    }

    pub fn updates(&self) -> usize {
        self.state.updates.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.state.refreshes.load(Ordering::SeqCst)
    }

    pub fn enumerations(&self) -> usize {
        self.state.enumerations.load(Ordering::SeqCst)
    }

    pub fn workspace_count(&self) -> usize {
        lock(&self.state.workspaces).len()
    }

    /// A stream handle for `path`, whether or not the repository knows it.
    pub fn stream(&self, path: &str) -> Arc<dyn Stream> {
        Arc::new(FakeStream::new(path, self.state.clone()))
    }

    /// A change-submitted event for `stream_path` in this repository.
    pub fn change_event(self: &Arc<Self>, stream_path: &str) -> ChangeSubmittedEvent {
        let repository: Arc<dyn Repository> = self.clone();
        ChangeSubmittedEvent {
            repository: Some(repository),
            stream: Some(self.stream(stream_path)),
        }
    }

    /// A stream-created event for this repository.
    pub fn stream_created_event(self: &Arc<Self>) -> StreamCreatedEvent {
        let repository: Arc<dyn Repository> = self.clone();
        StreamCreatedEvent {
            repository: Some(repository),
        }
    }
}

impl Repository for FakeRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn stream_by_path(&self, path: &str) -> Option<Arc<dyn Stream>> {
        let wanted = trim_stream(path);
        let streams = lock(&self.state.streams);
        let found = streams.iter().find(|s| trim_stream(s) == wanted)?;
        Some(Arc::new(FakeStream::new(found, self.state.clone())))
    }

    fn refresh_streams(&self) {
        self.state.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn workspaces(&self) -> shadow_core::Result<Vec<Box<dyn Workspace>>> {
        self.state.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_enumeration.load(Ordering::SeqCst) {
            return Err(Error::backend("workspace listing unavailable"));
        }

        Ok(lock(&self.state.workspaces)
            .iter()
            .map(|(name, path)| {
                Box::new(FakeWorkspace {
                    name: name.clone(),
                    path: path.clone(),
                    state: self.state.clone(),
                }) as Box<dyn Workspace>
            })
            .collect())
    }
}

#[derive(Debug)]
struct FakeStream {
    name: String,
    path: String,
    state: Arc<RepoState>,
}

impl FakeStream {
    fn new(path: &str, state: Arc<RepoState>) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            name,
            path: path.to_string(),
            state,
        }
    }
}

impl Stream for FakeStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn create_workspace(&self, spec: &WorkspaceSpec) -> shadow_core::Result<()> {
        lock(&self.state.creations).push(spec.clone());

        match *lock(&self.state.create) {
            CreateBehavior::Refuse => Err(Error::backend("workspace creation refused")),
            CreateBehavior::Vanish => Ok(()),
            CreateBehavior::Register => {
                let mut workspaces = lock(&self.state.workspaces);
                let name = if spec.name.is_empty() {
                    format!("shadow-{}", workspaces.len() + 1)
                } else {
                    spec.name.clone()
                };
                workspaces.push((name, spec.path.clone()));
                Ok(())
            }
        }
    }
}

#[derive(Debug)]
struct FakeWorkspace {
    name: String,
    path: NormalizedPath,
    state: Arc<RepoState>,
}

impl Workspace for FakeWorkspace {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &NormalizedPath {
        &self.path
    }

    fn manages_path(&self, path: &NormalizedPath) -> bool {
        self.path.same_location(path)
    }

    fn update_to_latest(&self) -> Result<ReturnCode, UpdateError> {
        self.state.updates.fetch_add(1, Ordering::SeqCst);
        match *lock(&self.state.update) {
            UpdateBehavior::Complete(code) => Ok(code),
            UpdateBehavior::Abort(code) => Err(UpdateError::new(code, "update aborted")),
        }
    }
}

/// A connection serving [`FakeRepository`] instances.
pub struct FakeConnection {
    data_dir: NormalizedPath,
    repositories: Mutex<Vec<Arc<FakeRepository>>>,
    handlers: Mutex<Vec<Arc<dyn EventHandler>>>,
}

impl FakeConnection {
    pub fn new(data_dir: impl Into<NormalizedPath>) -> Self {
        Self {
            data_dir: data_dir.into(),
            repositories: Mutex::new(Vec::new()),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_repository(self, repository: Arc<FakeRepository>) -> Self {
        lock(&self.repositories).push(repository);
        self
    }

    /// Number of handlers registered so far.
    pub fn handler_count(&self) -> usize {
        lock(&self.handlers).len()
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

    /// Deliver a change-submitted event to every handler.
    pub fn submit(&self, event: &ChangeSubmittedEvent) {
        for handler in self.handlers() {
            handler.on_change_submitted(event);
        }
    }

    /// Deliver a stream-created event to every handler.
    pub fn stream_created(&self, event: &StreamCreatedEvent) {
        for handler in self.handlers() {
            handler.on_stream_created(event);
        }
    }
}

impl Connection for FakeConnection {
    fn repository_by_name(&self, name: &str) -> Option<Arc<dyn Repository>> {
        let repositories = lock(&self.repositories);
        let found: Arc<dyn Repository> = repositories
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))?
            .clone();
        Some(found)
    }

    fn data_directory(&self) -> NormalizedPath {
        self.data_dir.clone()
    }

    fn register(&self, handler: Arc<dyn EventHandler>) {
        lock(&self.handlers).push(handler);
    }
}
