//! Background mirroring of local changes to the remote store.
//!
//! Each session owns one mirror queue: an unbounded channel drained by a single
//! worker task, so writes reach the remote store in the order they were made.
//! A write is retried a bounded number of times and then dropped; the outcome
//! only ever shows up in [`MirrorStats`] and the logs, never in session state.

use crate::config::AppSettings;
use crate::errors::Result;
use crate::models::{Challenge, Memory, Note, OwnerId, Plan, Profile};
use crate::store::{RemoteStore, records, with_timeout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// One change to copy to the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorWrite {
    /// Merge-write the whole profile
    SaveProfile(Profile),
    /// Write a note
    UpsertNote(Note),
    /// Remove a note by local id
    DeleteNote(String),
    /// Write a plan
    UpsertPlan(Plan),
    /// Remove a plan by local id
    DeletePlan(String),
    /// Write a memory
    UpsertMemory(Memory),
    /// Remove a memory by local id
    DeleteMemory(String),
    /// Write the full challenge record
    UpsertChallenge(Challenge),
}

impl MirrorWrite {
    /// Short name for logs
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SaveProfile(_) => "save_profile",
            Self::UpsertNote(_) => "upsert_note",
            Self::DeleteNote(_) => "delete_note",
            Self::UpsertPlan(_) => "upsert_plan",
            Self::DeletePlan(_) => "delete_plan",
            Self::UpsertMemory(_) => "upsert_memory",
            Self::DeleteMemory(_) => "delete_memory",
            Self::UpsertChallenge(_) => "upsert_challenge",
        }
    }

    async fn apply(&self, remote: &dyn RemoteStore, owner: &OwnerId) -> Result<()> {
        match self {
            Self::SaveProfile(profile) => records::save_profile(remote, owner, profile).await,
            Self::UpsertNote(note) => records::upsert_note(remote, owner, note).await,
            Self::DeleteNote(id) => records::delete_note(remote, owner, id).await,
            Self::UpsertPlan(plan) => records::upsert_plan(remote, owner, plan).await,
            Self::DeletePlan(id) => records::delete_plan(remote, owner, id).await,
            Self::UpsertMemory(memory) => records::upsert_memory(remote, owner, memory).await,
            Self::DeleteMemory(id) => records::delete_memory(remote, owner, id).await,
            Self::UpsertChallenge(challenge) => {
                records::upsert_challenge(remote, owner, challenge).await
            }
        }
    }
}

/// Retry policy of the mirror worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorPolicy {
    /// Deadline of each attempt
    pub timeout: Duration,
    /// Attempts before a write is dropped (at least one)
    pub max_attempts: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

impl From<&AppSettings> for MirrorPolicy {
    fn from(settings: &AppSettings) -> Self {
        Self {
            timeout: settings.remote_timeout,
            max_attempts: settings.mirror_max_attempts.max(1),
            retry_delay: settings.mirror_retry_delay,
        }
    }
}

/// Counters of the mirror worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    /// Writes that reached the remote store
    pub applied: u64,
    /// Attempts that failed and were retried
    pub retried: u64,
    /// Writes dropped after the last attempt failed
    pub failed: u64,
}

enum Job {
    Write(MirrorWrite),
    Flush(oneshot::Sender<()>),
}

/// Handle to a session's mirror worker
#[derive(Debug)]
pub struct MirrorQueue {
    sender: mpsc::UnboundedSender<Job>,
    stats: Arc<RwLock<MirrorStats>>,
    worker: JoinHandle<()>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write(write) => write!(f, "Write({})", write.label()),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl MirrorQueue {
    /// Starts the worker task for `owner`. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn spawn(owner: OwnerId, remote: Arc<dyn RemoteStore>, policy: MirrorPolicy) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(RwLock::new(MirrorStats::default()));
        let worker = tokio::spawn(run_worker(
            owner,
            remote,
            policy,
            receiver,
            Arc::clone(&stats),
        ));
        Self {
            sender,
            stats,
            worker,
        }
    }

    /// Queues a write without waiting for it.
    pub fn enqueue(&self, write: MirrorWrite) {
        trace!("Queueing mirror write {}", write.label());
        if self.sender.send(Job::Write(write)).is_err() {
            warn!("Mirror worker has stopped; dropping write");
        }
    }

    /// Waits until every write queued so far has been applied or dropped.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Snapshot of the worker counters
    pub async fn stats(&self) -> MirrorStats {
        *self.stats.read().await
    }

    /// Drains the queue, stops the worker and returns the final counters.
    pub async fn shutdown(self) -> MirrorStats {
        let Self {
            sender,
            stats,
            worker,
        } = self;
        drop(sender);
        if let Err(e) = worker.await {
            warn!("Mirror worker ended abnormally: {}", e);
        }
        *stats.read().await
    }
}

async fn run_worker(
    owner: OwnerId,
    remote: Arc<dyn RemoteStore>,
    policy: MirrorPolicy,
    mut receiver: mpsc::UnboundedReceiver<Job>,
    stats: Arc<RwLock<MirrorStats>>,
) {
    debug!("Mirror worker started for {}", owner);
    while let Some(job) = receiver.recv().await {
        match job {
            Job::Flush(done) => {
                let _ = done.send(());
            }
            Job::Write(write) => {
                apply_with_retry(&owner, remote.as_ref(), policy, &write, &stats).await;
            }
        }
    }
    debug!("Mirror worker stopped for {}", owner);
}

async fn apply_with_retry(
    owner: &OwnerId,
    remote: &dyn RemoteStore,
    policy: MirrorPolicy,
    write: &MirrorWrite,
    stats: &RwLock<MirrorStats>,
) {
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match with_timeout(policy.timeout, write.apply(remote, owner)).await {
            Ok(()) => {
                stats.write().await.applied += 1;
                trace!("Mirrored {} for {}", write.label(), owner);
                return;
            }
            Err(e) if attempt < max_attempts => {
                stats.write().await.retried += 1;
                debug!(
                    "Mirror {} for {} failed (attempt {}/{}): {}",
                    write.label(),
                    owner,
                    attempt,
                    max_attempts,
                    e
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            Err(e) => {
                stats.write().await.failed += 1;
                warn!(
                    "Dropping mirror {} for {} after {} attempts: {}",
                    write.label(),
                    owner,
                    max_attempts,
                    e
                );
            }
        }
    }
}
