//! Serialization of runs that share a group path

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Hierarchical key; runs with equal paths never overlap
pub type JobGroupPath = Vec<String>;

#[derive(Debug, Default)]
struct Inner {
    busy: Mutex<HashSet<JobGroupPath>>,
    released: Condvar,
}

/// Registry of busy job groups, shared by every runner in the process
#[derive(Debug, Default, Clone)]
pub struct JobGroups {
    inner: Arc<Inner>,
}

impl JobGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `path` is free, then hold it until the guard drops
    #[must_use]
    pub fn acquire(&self, path: JobGroupPath) -> JobGroupGuard {
        let mut busy = self
            .inner
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while busy.contains(&path) {
            tracing::debug!(group = ?path, "waiting for job group");
            busy = self
                .inner
                .released
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        busy.insert(path.clone());

        JobGroupGuard {
            inner: Arc::clone(&self.inner),
            path,
        }
    }

    /// Take `path` only if nobody holds it
    #[must_use]
    pub fn try_acquire(&self, path: JobGroupPath) -> Option<JobGroupGuard> {
        let mut busy = self
            .inner
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !busy.insert(path.clone()) {
            return None;
        }
        Some(JobGroupGuard {
            inner: Arc::clone(&self.inner),
            path,
        })
    }
}

/// Holds a job group; releases it on drop
#[derive(Debug)]
pub struct JobGroupGuard {
    inner: Arc<Inner>,
    path: JobGroupPath,
}

impl JobGroupGuard {
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl Drop for JobGroupGuard {
    fn drop(&mut self) {
        let mut busy = self
            .inner
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        busy.remove(&self.path);
        drop(busy);
        self.inner.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn group(file_ref: &str) -> JobGroupPath {
        vec!["adminTools".into(), "import".into(), file_ref.into()]
    }

    #[test]
    fn test_same_group_is_exclusive() {
        let groups = JobGroups::new();
        let guard = groups.acquire(group("Main.WebHome@pkg.zip"));
        assert!(groups.try_acquire(group("Main.WebHome@pkg.zip")).is_none());
        drop(guard);
        assert!(groups.try_acquire(group("Main.WebHome@pkg.zip")).is_some());
    }

    #[test]
    fn test_different_groups_do_not_block() {
        let groups = JobGroups::new();
        let _first = groups.acquire(group("a.zip"));
        assert!(groups.try_acquire(group("b.zip")).is_some());
    }

    #[test]
    fn test_waiter_runs_after_release() {
        let groups = JobGroups::new();
        let guard = groups.acquire(group("a.zip"));
        let (tx, rx) = mpsc::channel();

        let waiter = {
            let groups = groups.clone();
            thread::spawn(move || {
                let _guard = groups.acquire(group("a.zip"));
                tx.send(()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(guard);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }
}
