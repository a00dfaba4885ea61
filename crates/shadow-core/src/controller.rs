//! Event dispatch for one shadow folder

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{MirrorConfig, MirrorSettings};
use crate::host::{
    ChangeSubmittedEvent, Connection, EventHandler, Repository, StreamCreatedEvent,
};
use crate::resolver::WorkspaceResolver;
use crate::sync::{SyncOutcome, synchronize};
use crate::{Error, Result};

/// Startup state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The startup synchronization has not run yet.
    Priming,
    /// Idle callbacks are no-ops; only submitted changes trigger work.
    Steady,
}

/// What a controller did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A workspace was resolved and an update attempted.
    Synchronized(SyncOutcome),
    /// No workspace could be resolved, so no update was attempted.
    NotAttempted,
    /// The event concerns a different repository or stream.
    Ignored,
    /// The event lacked its repository or stream.
    Malformed,
    /// The repository was asked to reload its streams.
    StreamsRefreshed,
    /// Idle callback after the startup synchronization.
    Skipped,
}

/// Keeps one target directory mirrored from one stream.
pub struct MirrorController {
    settings: MirrorSettings,
    repository: Arc<dyn Repository>,
    phase: Mutex<Phase>,
}

impl MirrorController {
    /// Resolve `config`, prepare the target directory and register with
    /// `connection`.
    ///
    /// On error nothing has been registered.
    pub fn start(config: &MirrorConfig, connection: &dyn Connection) -> Result<Arc<Self>> {
        let (repository, settings) = config.resolve(connection)?;

        shadow_fs::io::ensure_dir(&settings.target).map_err(|source| {
            Error::DirectoryCreation {
                path: settings.target.to_native(),
                source,
            }
        })?;

        let controller = Arc::new(Self::new(settings, repository));
        connection.register(controller.clone());

        tracing::info!(
            repository = %controller.settings.repository,
            stream = %controller.settings.stream,
            path = %controller.settings.target,
            "Shadow folder started"
        );
        Ok(controller)
    }

    /// Build a controller from already resolved settings.
    pub fn new(settings: MirrorSettings, repository: Arc<dyn Repository>) -> Self {
        Self {
            settings,
            repository,
            phase: Mutex::new(Phase::Priming),
        }
    }

    pub fn settings(&self) -> &MirrorSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the startup synchronization once.
    ///
    /// The phase lock is held for the whole pass, so an idle callback that
    /// arrives meanwhile waits and then finds the controller steady.
    pub fn idle(&self) -> Dispatch {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase == Phase::Steady {
            return Dispatch::Skipped;
        }

        tracing::debug!(repository = %self.settings.repository, "Running startup synchronization");
        let dispatch = self.resolve_and_sync(self.repository.as_ref());
        *phase = Phase::Steady;
        dispatch
    }

    pub fn stream_created(&self, event: &StreamCreatedEvent) -> Dispatch {
        match &event.repository {
            Some(repository) => {
                tracing::debug!(repository = %repository.name(), "Refreshing streams");
                repository.refresh_streams();
                Dispatch::StreamsRefreshed
            }
            None => Dispatch::Malformed,
        }
    }

    pub fn change_submitted(&self, event: &ChangeSubmittedEvent) -> Dispatch {
        let Some(repository) = &event.repository else {
            tracing::warn!("Repository not found for submitted change!");
            return Dispatch::Malformed;
        };
        let Some(stream) = &event.stream else {
            tracing::warn!("Stream not found for submitted change!");
            return Dispatch::Malformed;
        };

        tracing::info!(
            repository = %repository.name(),
            stream = %stream.name(),
            "Change detected"
        );

        if !self.settings.matches(repository.name(), stream.path()) {
            tracing::info!(
                repository = %repository.name(),
                stream = %stream.path(),
                configured_repository = %self.settings.repository,
                configured_stream = %self.settings.stream,
                "This change will be ignored because it is for a different repository or stream"
            );
            return Dispatch::Ignored;
        }

        tracing::info!("This change is the correct stream so will attempt to update the workspace");
        self.resolve_and_sync(repository.as_ref())
    }

    fn resolve_and_sync(&self, repository: &dyn Repository) -> Dispatch {
        match WorkspaceResolver::new(&self.settings).resolve(repository, true) {
            Some(workspace) => Dispatch::Synchronized(synchronize(workspace.as_ref())),
            None => Dispatch::NotAttempted,
        }
    }
}

impl EventHandler for MirrorController {
    fn on_idle(&self) {
        self.idle();
    }

    fn on_stream_created(&self, event: &StreamCreatedEvent) {
        self.stream_created(event);
    }

    fn on_change_submitted(&self, event: &ChangeSubmittedEvent) {
        self.change_submitted(event);
    }
}
