//! Background workers.
//!
//! A [`WorkerPool`] owns a fixed set of threads that drain the shared
//! [`ActionQueue`]. Each worker takes one action, runs it to completion through
//! the [`Dispatcher`], then takes the next. Failures are logged and the action
//! is dropped; nothing is retried and nobody is notified.
//!
//! ```text
//! ImageManager ──push──▶ ActionQueue ──pop──▶ worker 0..N ──▶ Dispatcher ──▶ StorageDrive
//! ```

use crate::imaging::{EncodedThumbnail, ImageBackend, ThumbnailConfig, create_thumbnail};
use crate::manager::ManagerError;
use crate::queue::{Action, ActionQueue, Pop};
use crate::storage::StorageDrive;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const TRACING_TARGET: &str = "photoshelf::worker";

/// Everything needed to carry out an [`Action`]: the current drive, the codec
/// backend, and the thumbnail settings.
///
/// The drive sits behind a lock so it can be swapped while workers run. Each
/// operation clones the handle once and works against that snapshot.
pub struct Dispatcher {
    drive: RwLock<Arc<dyn StorageDrive>>,
    backend: Arc<dyn ImageBackend>,
    thumbnails: ThumbnailConfig,
}

impl Dispatcher {
    pub fn new(
        drive: Arc<dyn StorageDrive>,
        backend: Arc<dyn ImageBackend>,
        thumbnails: ThumbnailConfig,
    ) -> Self {
        Self {
            drive: RwLock::new(drive),
            backend,
            thumbnails,
        }
    }

    pub fn drive(&self) -> Arc<dyn StorageDrive> {
        let guard = self.drive.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&*guard)
    }

    pub fn set_drive(&self, drive: Arc<dyn StorageDrive>) {
        *self.drive.write().unwrap_or_else(|p| p.into_inner()) = drive;
    }

    /// Generate and store the thumbnail for `path` on the calling thread.
    pub fn generate_thumbnail(
        &self,
        path: &str,
        content: &[u8],
    ) -> Result<EncodedThumbnail, ManagerError> {
        let drive = self.drive();
        Ok(create_thumbnail(
            self.backend.as_ref(),
            drive.as_ref(),
            path,
            content,
            &self.thumbnails,
        )?)
    }

    /// Run one action to completion.
    pub fn dispatch(&self, action: Action) -> Result<(), ManagerError> {
        match action {
            Action::Upload { path, content } => {
                let size = content.len() as u64;
                self.drive().upload(&path, &mut content.as_slice(), size)?;
            }
            Action::GenerateThumbnail { path, content } => {
                let thumb = self.generate_thumbnail(&path, &content)?;
                tracing::debug!(
                    target: TRACING_TARGET,
                    path = %path,
                    width = thumb.dimensions.width,
                    height = thumb.dimensions.height,
                    "thumbnail stored"
                );
            }
            Action::Delete { path } => {
                self.drive().delete(&path)?;
            }
        }
        Ok(())
    }
}

/// A fixed set of worker threads draining one queue.
pub struct WorkerPool {
    queue: Arc<ActionQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers. They start pulling from `queue` immediately.
    ///
    /// Fails only if the OS refuses to create a thread; any workers already
    /// spawned are stopped before returning.
    pub fn start(
        count: usize,
        poll_interval: Duration,
        queue: Arc<ActionQueue>,
        dispatcher: Arc<Dispatcher>,
    ) -> std::io::Result<Self> {
        let mut pool = Self {
            queue: Arc::clone(&queue),
            handles: Vec::with_capacity(count),
        };
        for id in 0..count {
            let queue = Arc::clone(&queue);
            let dispatcher = Arc::clone(&dispatcher);
            let handle = thread::Builder::new()
                .name(format!("photoshelf-worker-{id}"))
                .spawn(move || run_worker(id, &queue, &dispatcher, poll_interval))?;
            pool.handles.push(handle);
        }
        tracing::info!(target: TRACING_TARGET, workers = count, "worker pool started");
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Close the queue, let workers finish everything already queued, and join them.
    ///
    /// Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.queue.close();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!(target: TRACING_TARGET, "worker thread panicked");
            }
        }
        tracing::info!(target: TRACING_TARGET, "worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(id: usize, queue: &ActionQueue, dispatcher: &Dispatcher, poll_interval: Duration) {
    tracing::info!(target: TRACING_TARGET, worker = id, "worker started");
    loop {
        match queue.pop_timeout(poll_interval) {
            Pop::Action(action) => process(id, dispatcher, action),
            Pop::Idle => continue,
            Pop::Closed => break,
        }
    }
    tracing::info!(target: TRACING_TARGET, worker = id, "worker stopped");
}

fn process(id: usize, dispatcher: &Dispatcher, action: Action) {
    let kind = action.kind();
    let path = action.path().to_string();
    tracing::debug!(
        target: TRACING_TARGET,
        worker = id,
        action = kind,
        path = %path,
        "dispatching"
    );

    // A panicking codec must not take the worker down with it.
    match panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(action))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(
            target: TRACING_TARGET,
            worker = id,
            action = kind,
            path = %path,
            error = %err,
            "action failed, dropping"
        ),
        Err(_) => tracing::error!(
            target: TRACING_TARGET,
            worker = id,
            action = kind,
            path = %path,
            "action panicked, dropping"
        ),
    }
}
