//! Retry queue for failed obligation syncs
//!
//! A failed sync never fails the compliance transaction that produced the
//! obligation; it lands here and is retried with exponential backoff until
//! it succeeds or exhausts its attempts.

use crate::{sync::ObligationSync, Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// One queued sync retry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    /// Obligation awaiting sync
    pub obligation_id: Uuid,
    /// When the original sync failed
    pub failed_at: DateTime<Utc>,
    /// Last error message
    pub last_error: String,
    /// Retry attempts made so far
    pub retry_count: u32,
    /// Earliest next attempt
    pub next_retry_at: DateTime<Utc>,
    /// True once max attempts are exhausted; kept for operator review
    pub exhausted: bool,
}

/// Retry queue with exponential backoff
pub struct SyncRetryQueue {
    jobs: RwLock<Vec<SyncJob>>,
    max_size: usize,
    max_retry_attempts: u32,
}

impl SyncRetryQueue {
    /// Create a queue with the given capacity and attempt budget
    pub fn new(max_size: usize, max_retry_attempts: u32) -> Self {
        Self {
            jobs: RwLock::new(Vec::new()),
            max_size,
            max_retry_attempts,
        }
    }

    /// Queue a failed sync for retry
    pub async fn push(&self, obligation_id: Uuid, error: String) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.len() >= self.max_size {
            return Err(Error::QueueFull {
                current: jobs.len(),
                max: self.max_size,
            });
        }

        jobs.push(SyncJob {
            obligation_id,
            failed_at: Utc::now(),
            last_error: error,
            retry_count: 0,
            next_retry_at: Self::next_retry(0),
            exhausted: false,
        });

        info!(%obligation_id, "Obligation sync queued for retry");
        Ok(())
    }

    /// Retry every job whose backoff has elapsed; returns the number of
    /// successful syncs
    pub async fn process_due(&self, adapter: &dyn ObligationSync) -> usize {
        let now = Utc::now();
        let mut jobs = self.jobs.write().await;
        let mut synced = 0;

        let mut i = 0;
        while i < jobs.len() {
            if jobs[i].exhausted || jobs[i].next_retry_at > now {
                i += 1;
                continue;
            }

            let obligation_id = jobs[i].obligation_id;
            match adapter.sync_obligation(obligation_id).await {
                Ok(()) => {
                    info!(
                        %obligation_id,
                        attempt = jobs[i].retry_count + 1,
                        "Obligation sync retry succeeded"
                    );
                    jobs.remove(i);
                    synced += 1;
                }
                Err(e) => {
                    let job = &mut jobs[i];
                    job.retry_count += 1;
                    job.last_error = e.to_string();
                    if job.retry_count >= self.max_retry_attempts {
                        warn!(
                            %obligation_id,
                            attempts = job.retry_count,
                            "Obligation sync retries exhausted"
                        );
                        job.exhausted = true;
                    } else {
                        job.next_retry_at = Self::next_retry(job.retry_count);
                    }
                    i += 1;
                }
            }
        }

        synced
    }

    /// Queue depth, exhausted jobs included
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// True when nothing is queued
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Snapshot of the queued jobs
    pub async fn jobs(&self) -> Vec<SyncJob> {
        self.jobs.read().await.clone()
    }

    /// Exponential backoff: 2^attempt seconds, capped at 64
    fn next_retry(attempt: u32) -> DateTime<Utc> {
        let delay_secs = 2i64.pow(attempt.min(6));
        Utc::now() + Duration::seconds(delay_secs)
    }
}
