//! Serialized background execution for whole runs.

use std::sync::mpsc;
use std::thread::JoinHandle;
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A dedicated single-worker queue.
///
/// Export and import runs for a profile are submitted here so two runs
/// never interleave their writes to the same document or store. The
/// concurrency limit is exactly one: jobs run on a single background
/// thread in submission order. Dropping the queue waits for submitted
/// jobs to finish.
pub struct ExportQueue {
    sender: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl ExportQueue {
    /// Spawns the worker thread.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = std::thread::spawn(move || {
            while let Ok(job) = receiver.recv() {
                job();
            }
            debug!("export queue worker exiting");
        });
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Submits a job to run after every previously submitted job.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender {
            // Send only fails when the worker is gone, which cannot
            // happen while the queue holds the handle.
            let _ = sender.send(Box::new(job));
        }
    }
}

impl Default for ExportQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExportQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
