//! Process-wide registry of long-running streaming jobs.
//!
//! A streaming statement's cluster job outlives the operation that produced
//! it. The registry maps each known job identifier to the session/operation
//! pair that produced it and the next unread result token, so that later,
//! independent calls can resume paging without re-submitting the query.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::Mutex as AsyncMutex;

/// Paging state for one tracked job.
#[derive(Debug)]
pub struct JobCursor {
    pub session: String,
    pub operation: String,
    /// Next unread result token. Only ever advances.
    pub next_token: u64,
}

impl JobCursor {
    /// Advance the cursor to `candidate` unless it would regress.
    pub fn advance_to(&mut self, candidate: u64) {
        if candidate > self.next_token {
            self.next_token = candidate;
        }
    }
}

/// In-memory job-id → cursor map.
///
/// Each entry is wrapped in its own async mutex; a fetch holds that lock
/// across the gateway round-trip so the read-fetch-advance sequence is
/// serialized per job. Entries never expire; only [`remove`](Self::remove)
/// (called during cancellation) deletes them.
#[derive(Default)]
pub struct JobStreamRegistry {
    entries: StdMutex<HashMap<String, Arc<AsyncMutex<JobCursor>>>>,
}

impl JobStreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a job whose token 0 has already been consumed to learn its
    /// identifier; paging therefore starts at token 1.
    pub fn register(&self, job_id: &str, session: &str, operation: &str) {
        let cursor = JobCursor {
            session: session.to_string(),
            operation: operation.to_string(),
            next_token: 1,
        };
        self.entries
            .lock()
            .unwrap()
            .insert(job_id.to_string(), Arc::new(AsyncMutex::new(cursor)));
    }

    pub fn lookup(&self, job_id: &str) -> Option<Arc<AsyncMutex<JobCursor>>> {
        self.entries.lock().unwrap().get(job_id).cloned()
    }

    /// Remove a job; returns whether it was tracked.
    pub fn remove(&self, job_id: &str) -> bool {
        self.entries.lock().unwrap().remove(job_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_starts_at_token_one() {
        let registry = JobStreamRegistry::new();
        registry.register("job-1", "sess-1", "op-1");

        let cursor = registry.lookup("job-1").unwrap();
        let cursor = cursor.lock().await;
        assert_eq!(cursor.session, "sess-1");
        assert_eq!(cursor.operation, "op-1");
        assert_eq!(cursor.next_token, 1);
    }

    #[tokio::test]
    async fn test_advance_never_regresses() {
        let registry = JobStreamRegistry::new();
        registry.register("job-1", "s", "op");

        let cursor = registry.lookup("job-1").unwrap();
        let mut guard = cursor.lock().await;
        guard.advance_to(4);
        assert_eq!(guard.next_token, 4);
        guard.advance_to(2);
        assert_eq!(guard.next_token, 4);
        guard.advance_to(5);
        assert_eq!(guard.next_token, 5);
    }

    #[test]
    fn test_lookup_unknown_job() {
        let registry = JobStreamRegistry::new();
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn test_remove() {
        let registry = JobStreamRegistry::new();
        registry.register("job-1", "s", "op");
        assert!(registry.remove("job-1"));
        assert!(registry.lookup("job-1").is_none());
        assert!(!registry.remove("job-1"));
    }
}
