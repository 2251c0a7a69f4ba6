//! Generation tracking for tailoring flows.
//!
//! Every submission on a flow takes a lease carrying a fresh generation number.
//! Starting a new submission or cancelling the flow supersedes the previous
//! lease and aborts its in-flight task. A response is archived only if its
//! lease is still current when it arrives; stale responses are discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::{error, info};

use crate::history::{HistoryError, HistoryStore};
use crate::models::history::{EntryMeta, HistoryEntry};
use crate::tailoring::{failure_outcome, TailorRequest, TailoringClient};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Flow '{0}' was superseded before the tailoring response arrived")]
    Superseded(String),

    #[error(transparent)]
    History(#[from] HistoryError),
}

struct FlowState {
    generation: u64,
    in_flight: Option<AbortHandle>,
}

/// Tracks the active generation of every flow (one per client view).
#[derive(Clone, Default)]
pub struct FlowTracker {
    next_generation: Arc<AtomicU64>,
    flows: Arc<Mutex<HashMap<String, FlowState>>>,
}

impl FlowTracker {
    fn flows(&self) -> MutexGuard<'_, HashMap<String, FlowState>> {
        self.flows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new submission on `flow_id`, superseding any earlier one.
    pub fn begin(&self, flow_id: &str) -> FlowLease {
        let flow_id = flow_key(flow_id);
        // Generations are unique across all flows, so a released flow id can be
        // reused without an old lease ever matching the new state.
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self.flows().insert(
            flow_id.to_string(),
            FlowState {
                generation,
                in_flight: None,
            },
        );
        if let Some(handle) = previous.and_then(|p| p.in_flight) {
            handle.abort();
        }
        FlowLease {
            tracker: self.clone(),
            flow_id: flow_id.to_string(),
            generation,
        }
    }

    /// Supersedes the active submission on `flow_id`, if any. Returns whether
    /// there was one.
    pub fn cancel(&self, flow_id: &str) -> bool {
        match self.flows().remove(flow_key(flow_id)) {
            Some(state) => {
                if let Some(handle) = state.in_flight {
                    handle.abort();
                }
                true
            }
            None => false,
        }
    }

    pub fn active_flows(&self) -> usize {
        self.flows().len()
    }

    fn is_current(&self, flow_id: &str, generation: u64) -> bool {
        self.flows()
            .get(flow_id)
            .is_some_and(|s| s.generation == generation)
    }

    fn attach(&self, flow_id: &str, generation: u64, handle: AbortHandle) {
        let mut flows = self.flows();
        match flows.get_mut(flow_id) {
            Some(state) if state.generation == generation => state.in_flight = Some(handle),
            _ => handle.abort(),
        }
    }

    fn release(&self, flow_id: &str, generation: u64) {
        let mut flows = self.flows();
        if flows.get(flow_id).is_some_and(|s| s.generation == generation) {
            if let Some(state) = flows.remove(flow_id) {
                if let Some(handle) = state.in_flight {
                    handle.abort();
                }
            }
        }
    }
}

/// Flow ids are compared with surrounding whitespace removed.
pub fn flow_key(flow_id: &str) -> &str {
    flow_id.trim()
}

/// A submission's claim on its flow. Dropping the lease (for example when the
/// HTTP caller disconnects) aborts the in-flight task and releases the flow.
pub struct FlowLease {
    tracker: FlowTracker,
    flow_id: String,
    generation: u64,
}

impl FlowLease {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.tracker.is_current(&self.flow_id, self.generation)
    }

    pub fn attach(&self, handle: AbortHandle) {
        self.tracker.attach(&self.flow_id, self.generation, handle);
    }
}

impl Drop for FlowLease {
    fn drop(&mut self) {
        self.tracker.release(&self.flow_id, self.generation);
    }
}

/// Runs one tailoring submission on `flow_id` and archives the outcome.
///
/// The remote call runs as an abortable task. Success and failure outcomes
/// are both archived; a superseded submission archives nothing.
pub async fn run_flow(
    client: &TailoringClient,
    flows: &FlowTracker,
    history: &HistoryStore,
    flow_id: &str,
    request: TailorRequest,
    meta: EntryMeta,
) -> Result<HistoryEntry, FlowError> {
    let lease = flows.begin(flow_id);

    let task_client = client.clone();
    let task_request = request.clone();
    let task = tokio::spawn(async move { task_client.tailor(&task_request).await });
    lease.attach(task.abort_handle());

    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => {
            info!(flow_id, generation = lease.generation(), "Tailoring task aborted, flow superseded");
            return Err(FlowError::Superseded(flow_id.to_string()));
        }
        Err(e) => {
            error!(flow_id, error = %e, "Tailoring task panicked, archiving sentinel outcome");
            failure_outcome(&request)
        }
    };

    if !lease.is_current() {
        info!(
            flow_id,
            generation = lease.generation(),
            "Discarding stale tailoring response"
        );
        return Err(FlowError::Superseded(flow_id.to_string()));
    }

    Ok(history.append(outcome, meta).await?)
}
