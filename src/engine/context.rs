use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::SowResult;
use crate::lifecycle::StatusBoard;
use crate::types::{ProgressEvent, ProgressKind, RunId};

const HISTORY_LIMIT: usize = 200;
const CHANNEL_CAPACITY: usize = 256;

/// State owned by a single analysis/execution run: the status board, the
/// progress channel and history, and the cooperative stop flag.
#[derive(Debug)]
pub struct RunContext {
    id: RunId,
    board: Mutex<StatusBoard>,
    history: Mutex<VecDeque<ProgressEvent>>,
    events_tx: broadcast::Sender<ProgressEvent>,
    stopped: AtomicBool,
}

impl RunContext {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (events_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            board: Mutex::new(StatusBoard::new(roles)),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
            events_tx,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    /// Puts every role back to Waiting and clears the history. A pending stop
    /// request survives the reset.
    pub fn reset(&self) {
        self.board.lock().reset();
        self.history.lock().clear();
    }

    /// Applies the event to the status board, then records and broadcasts it.
    /// Rejected transitions are neither recorded nor broadcast.
    pub fn emit(&self, kind: ProgressKind) -> SowResult<()> {
        self.board.lock().apply(&kind)?;
        log_event(&kind);

        let event = ProgressEvent::now(kind);
        let mut history = self.history.lock();
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(event.clone());
        // Sent under the history lock so subscribe_with_history never sees an event twice.
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events_tx.subscribe()
    }

    pub fn history(&self) -> Vec<ProgressEvent> {
        self.history.lock().iter().cloned().collect()
    }

    /// History and a live receiver taken together, so no event falls between them.
    pub fn subscribe_with_history(&self) -> (Vec<ProgressEvent>, broadcast::Receiver<ProgressEvent>) {
        let history = self.history.lock();
        let rx = self.events_tx.subscribe();
        (history.iter().cloned().collect(), rx)
    }

    pub fn status_snapshot(&self) -> StatusBoard {
        self.board.lock().clone()
    }

    pub fn stop(&self) {
        log::info!("Stop requested for run {}", self.id);
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn clear_stop(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }
}

fn log_event(kind: &ProgressKind) {
    match kind {
        ProgressKind::AgentCreated {
            role,
            name,
            task_count,
        } => log::info!("Created agent for {} ({}) with {} tasks", role, name, task_count),
        ProgressKind::TaskAssigned { role, task } => log::info!("Assigning task to {}: {}", role, task),
        ProgressKind::TaskCompleted { role, task } => log::info!("Completed task for {}: {}", role, task),
        ProgressKind::TaskFailed { role, task, error } => {
            log::error!("Task failed for {} ({}): {}", role, task, error)
        }
        ProgressKind::RunCompleted { .. } => log::info!("Run completed"),
        ProgressKind::RunHalted { reason } => log::warn!("Run halted: {:?}", reason),
    }
}
