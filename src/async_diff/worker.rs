use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::ErrorSink;
use crate::git::types::DiffOption;
use crate::state::DiffSession;

use super::channel::{DiffRequest, SessionUpdate};
use super::classifier::DiffClassifier;

/// Runs classifications in the background and hands results back to the
/// single task that owns session state.
///
/// Must be created inside a tokio runtime.
pub struct DiffWorker {
    repo_path: PathBuf,
    request_tx: mpsc::UnboundedSender<DiffRequest>,
    update_rx: mpsc::UnboundedReceiver<SessionUpdate>,
    generation: u64,
    errors: Arc<dyn ErrorSink>,
    runtime: Handle,
}

impl DiffWorker {
    pub fn new(repo_path: PathBuf, classifier: DiffClassifier, errors: Arc<dyn ErrorSink>) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<DiffRequest>();
        let (update_tx, update_rx) = mpsc::unbounded_channel::<SessionUpdate>();

        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                let classifier = classifier.clone();
                let tx = update_tx.clone();

                // Requests run concurrently; updates arrive in completion order.
                tokio::spawn(async move {
                    let content = classifier
                        .classify(&request.option)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(SessionUpdate {
                        generation: request.generation,
                        content,
                    });
                });
            }
        });

        Self {
            repo_path,
            request_tx,
            update_rx,
            generation: 0,
            errors,
            runtime: Handle::current(),
        }
    }

    /// Start a new session. It is returned immediately in the loading state,
    /// showing `previous`'s content until its own result is applied.
    pub fn create_session(
        &mut self,
        option: DiffOption,
        previous: Option<&DiffSession>,
    ) -> DiffSession {
        self.generation += 1;
        let session = DiffSession::new(self.generation, self.repo_path.clone(), option, previous)
            .with_runtime(self.runtime.clone());
        let _ = self.request_tx.send(DiffRequest {
            generation: self.generation,
            option: session.option().clone(),
        });
        session
    }

    /// Generation of the most recently created session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn try_recv(&mut self) -> Option<SessionUpdate> {
        self.update_rx.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<SessionUpdate> {
        self.update_rx.recv().await
    }

    /// Apply one update to `current`. Results for superseded sessions are dropped.
    pub fn apply(&self, update: SessionUpdate, current: &mut DiffSession) -> bool {
        if update.generation < self.generation {
            log::debug!(
                "dropping diff result for superseded session {}",
                update.generation
            );
            return false;
        }
        if let Err(message) = &update.content {
            self.errors.raise(&self.repo_path, message);
        }
        current.apply(update)
    }

    /// Drain every pending update into `current`. Returns true if it changed.
    pub fn poll(&mut self, current: &mut DiffSession) -> bool {
        let mut changed = false;
        while let Some(update) = self.try_recv() {
            changed |= self.apply(update, current);
        }
        changed
    }

    /// Wait until `current` has finished loading. Returns at once for a
    /// superseded session, whose result would never be applied.
    pub async fn wait(&mut self, current: &mut DiffSession) {
        while current.is_loading() && current.generation() == self.generation {
            let Some(update) = self.recv().await else {
                break;
            };
            self.apply(update, current);
        }
    }
}
