use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use super::job::{Job, JobId, JobSnapshot};

/// Shared handle to one job
pub type JobHandle = Arc<Mutex<Job>>;

/// In-memory job table
///
/// The map lock is only held to insert or look up a handle; job updates lock
/// the individual job.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobHandle>>>,
    history_capacity: usize,
}

impl JobRegistry {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            history_capacity,
        }
    }

    /// Register a new pending job under a fresh id
    pub fn create(&self) -> (JobId, JobHandle) {
        let id = Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(Job::new(id.clone(), self.history_capacity)));
        self.jobs.write().insert(id.clone(), Arc::clone(&handle));
        (id, handle)
    }

    pub fn get(&self, id: &str) -> Option<JobHandle> {
        self.jobs.read().get(id).cloned()
    }

    /// Snapshot of a job, `None` for unknown ids
    pub fn snapshot(&self, id: &str) -> Option<JobSnapshot> {
        self.get(id).map(|handle| handle.lock().snapshot())
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}
