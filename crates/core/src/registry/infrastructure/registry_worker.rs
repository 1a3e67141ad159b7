use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::registry::domain::identity_registry::{IdentityRegistry, Resolution};
use crate::registry::domain::registry_error::RegistryError;
use crate::shared::encoding::Encoding;

const DEFAULT_QUEUE_CAPACITY: usize = 64;

type Reply = Result<Resolution, RegistryError>;

struct ResolveRequest {
    encoding: Encoding,
    reply: Sender<Reply>,
}

/// Runs `resolve` on a dedicated thread that owns the registry.
///
/// Requests are processed one at a time in submission order, which gives the
/// same serialization as a lock without blocking the caller on disk writes.
pub struct RegistryWorker {
    requests: Option<Sender<ResolveRequest>>,
    handle: Option<JoinHandle<IdentityRegistry>>,
}

/// Result of a submitted [`RegistryWorker::resolve`] call.
pub struct PendingResolution {
    reply: Receiver<Reply>,
}

impl PendingResolution {
    /// Blocks until the worker has resolved the encoding.
    pub fn wait(self) -> Reply {
        self.reply.recv().map_err(|_| RegistryError::WorkerStopped)?
    }

    /// Returns the result if it is ready, without blocking.
    pub fn try_get(&self) -> Option<Reply> {
        self.reply.try_recv().ok()
    }
}

impl RegistryWorker {
    pub fn spawn(registry: IdentityRegistry) -> Self {
        Self::with_capacity(registry, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(registry: IdentityRegistry, capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded::<ResolveRequest>(capacity);
        let handle = spawn_resolver(registry, rx);
        Self {
            requests: Some(tx),
            handle: Some(handle),
        }
    }

    /// Queues `encoding` for resolution. Blocks only while the queue is full.
    pub fn resolve(&self, encoding: Encoding) -> Result<PendingResolution, RegistryError> {
        let requests = self.requests.as_ref().ok_or(RegistryError::WorkerStopped)?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        requests
            .send(ResolveRequest {
                encoding,
                reply: reply_tx,
            })
            .map_err(|_| RegistryError::WorkerStopped)?;
        Ok(PendingResolution { reply: reply_rx })
    }

    /// Drains queued requests, stops the thread and returns the registry.
    pub fn shutdown(mut self) -> Result<IdentityRegistry, RegistryError> {
        drop(self.requests.take());
        let handle = self.handle.take().ok_or(RegistryError::WorkerStopped)?;
        handle.join().map_err(|_| RegistryError::WorkerStopped)
    }
}

impl Drop for RegistryWorker {
    fn drop(&mut self) {
        drop(self.requests.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Registry worker panicked");
            }
        }
    }
}

fn spawn_resolver(
    mut registry: IdentityRegistry,
    requests: Receiver<ResolveRequest>,
) -> JoinHandle<IdentityRegistry> {
    std::thread::spawn(move || {
        for request in requests {
            let result = registry.resolve(&request.encoding);
            if let Err(e) = &result {
                log::warn!("Registry worker failed to resolve face: {e}");
            }
            // The caller may have dropped its PendingResolution.
            let _ = request.reply.send(result);
        }
        registry
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::domain::registry_config::RegistryConfig;
    use crate::registry::infrastructure::json_file_store::JsonFileStore;
    use tempfile::TempDir;

    fn along_axis(x: f64) -> Encoding {
        let mut values = vec![0.0; 128];
        values[0] = x;
        Encoding::new(values)
    }

    fn worker(tmp: &TempDir) -> RegistryWorker {
        let store = JsonFileStore::new(tmp.path().join("known_faces.json"));
        RegistryWorker::spawn(
            IdentityRegistry::open(Box::new(store), &RegistryConfig::default()).unwrap(),
        )
    }

    #[test]
    fn test_results_follow_submission_order() {
        let tmp = TempDir::new().unwrap();
        let worker = worker(&tmp);

        let pending: Vec<PendingResolution> = [0.0, 0.9, 0.3]
            .into_iter()
            .map(|x| worker.resolve(along_axis(x)).unwrap())
            .collect();
        let ids: Vec<u64> = pending.into_iter().map(|p| p.wait().unwrap().id).collect();

        assert_eq!(ids, vec![1, 2, 1]);
    }

    #[test]
    fn test_errors_are_delivered_to_the_caller() {
        let tmp = TempDir::new().unwrap();
        let worker = worker(&tmp);
        worker.resolve(along_axis(0.0)).unwrap().wait().unwrap();

        let result = worker.resolve(Encoding::new(vec![0.0; 3])).unwrap().wait();

        assert!(matches!(result, Err(RegistryError::InvalidEncoding { .. })));
    }

    #[test]
    fn test_shutdown_returns_registry_with_all_updates() {
        let tmp = TempDir::new().unwrap();
        let worker = worker(&tmp);
        let _ = worker.resolve(along_axis(0.0)).unwrap();
        let _ = worker.resolve(along_axis(5.0)).unwrap();

        let registry = worker.shutdown().unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.next_id(), 3);
    }

    #[test]
    fn test_try_get_eventually_yields_result() {
        let tmp = TempDir::new().unwrap();
        let worker = worker(&tmp);
        let pending = worker.resolve(along_axis(0.0)).unwrap();

        let result = loop {
            if let Some(result) = pending.try_get() {
                break result;
            }
            std::thread::yield_now();
        };

        assert!(result.unwrap().is_new);
    }
}
