use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use journal_desk_core::{
    recommendation_affordance, RecommendationAffordance, RecommendationRecord,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LinkageError {
    #[error("source error for journal {journal_id}: {message}")]
    Source { journal_id: u64, message: String },
}

/// Shared cancel flag for one refresh pass. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Handle for one refresh pass: the generation it writes under and the
/// token that aborts it when a newer pass supersedes it.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    generation: u64,
    token: CancellationToken,
}

impl RefreshTicket {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Keyed recommendation state for the journals on screen. Each journal id
/// maps to the latest fetched answer: present, confirmed absent, or never
/// fetched. Writes carry the generation of the refresh pass that produced
/// them; a superseded pass cannot land stale data.
#[derive(Debug, Default)]
pub struct LinkageBoard {
    entries: HashMap<u64, Option<RecommendationRecord>>,
    generation: u64,
    active: Option<CancellationToken>,
}

impl LinkageBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh pass: cancels the previous pass and bumps the
    /// generation so its late responses are rejected.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }
        self.generation += 1;
        let token = CancellationToken::new();
        self.active = Some(token.clone());
        RefreshTicket { generation: self.generation, token }
    }

    /// Record one fetched answer. Returns false (and writes nothing) when
    /// the ticket's pass has been superseded. Within the live pass, the
    /// last write per key wins; ordering across distinct keys is free.
    pub fn record_result(
        &mut self,
        ticket: &RefreshTicket,
        journal_id: u64,
        record: Option<RecommendationRecord>,
    ) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.entries.insert(journal_id, record);
        true
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn recommendation(&self, journal_id: u64) -> Option<&RecommendationRecord> {
        self.entries.get(&journal_id).and_then(Option::as_ref)
    }

    /// Affordance for a journal: never-fetched and confirmed-absent both
    /// offer "create".
    #[must_use]
    pub fn affordance(&self, journal_id: u64) -> RecommendationAffordance {
        recommendation_affordance(self.recommendation(journal_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Applied,
    Stale,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshSummary {
    pub applied: usize,
    pub stale: usize,
    pub failed: usize,
    pub cancelled: usize,
}

fn lock_board(board: &Mutex<LinkageBoard>) -> MutexGuard<'_, LinkageBoard> {
    match board.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Fan out one fetch per journal id and merge the answers into the board.
/// Completion order is unconstrained; each task re-checks the ticket before
/// fetching and before writing, so a superseded or cancelled pass stops
/// touching the board immediately.
pub async fn refresh_all<S, F>(
    board: Arc<Mutex<LinkageBoard>>,
    ticket: RefreshTicket,
    journal_ids: Vec<u64>,
    source: S,
) -> RefreshSummary
where
    S: Fn(u64) -> F + Clone + Send + 'static,
    F: Future<Output = Result<Option<RecommendationRecord>, LinkageError>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for journal_id in journal_ids {
        let source = source.clone();
        let ticket = ticket.clone();
        let board = Arc::clone(&board);
        tasks.spawn(async move {
            if ticket.is_cancelled() {
                return TaskOutcome::Cancelled;
            }
            match source(journal_id).await {
                Ok(record) => {
                    if ticket.is_cancelled() {
                        return TaskOutcome::Cancelled;
                    }
                    let mut board = lock_board(&board);
                    if board.record_result(&ticket, journal_id, record) {
                        TaskOutcome::Applied
                    } else {
                        TaskOutcome::Stale
                    }
                }
                Err(_) => TaskOutcome::Failed,
            }
        });
    }

    let mut summary = RefreshSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(TaskOutcome::Applied) => summary.applied += 1,
            Ok(TaskOutcome::Stale) => summary.stale += 1,
            Ok(TaskOutcome::Failed) => summary.failed += 1,
            Ok(TaskOutcome::Cancelled) | Err(_) => summary.cancelled += 1,
        }
    }
    summary
}
