//! Admission queue: bounded concurrency plus priority-class bandwidth caps.
//!
//! A counting gate (one permit per admission slot) bounds how many transfers
//! run at once. Admitted transfers live in the active set together with the
//! permit they hold; removing a transfer drops its permit and frees the slot.
//! Every admit, release or class change re-partitions the current capacity
//! estimate and pushes the new caps to the handles.
//!
//! Caps are computed under the active-set lock and pushed after it is
//! released. A separate re-allocation lock, always taken first, keeps the
//! pushes in the same order as the set changes that produced them.

mod allocator;
mod capacity;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{TaskId, TransferHandle};

pub use allocator::{BandwidthAllocator, ClassShares, Member, PriorityClass};
pub use capacity::{CapacityEstimate, FixedCapacity, ForecastCapacity};

/// Why a transfer was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("admission cancelled")]
    Cancelled,
    #[error("admission queue closed")]
    Closed,
    #[error("task {0} is already active")]
    AlreadyActive(TaskId),
}

/// What to admit: the handle plus its allocation inputs.
#[derive(Clone)]
pub struct AdmissionRequest {
    pub handle: Arc<dyn TransferHandle>,
    pub class: Option<PriorityClass>,
    /// Upper bound on this task's cap (0 = none).
    pub max_bytes_per_sec: u64,
}

/// Per-task view returned by [`AdmissionQueue::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    pub task_id: TaskId,
    pub class: Option<PriorityClass>,
    pub cap_bytes_per_sec: u64,
}

struct ActiveTask {
    handle: Arc<dyn TransferHandle>,
    class: Option<PriorityClass>,
    max_bytes_per_sec: u64,
    cap: u64,
    // Dropping the entry returns the slot.
    _permit: OwnedSemaphorePermit,
}

/// Caps to hand to the transfer layer once the active-set lock is released.
type CapUpdates = Vec<(Arc<dyn TransferHandle>, u64)>;

pub struct AdmissionQueue {
    slots: Arc<Semaphore>,
    limit: usize,
    active: Mutex<HashMap<TaskId, ActiveTask>>,
    realloc: Mutex<()>,
    allocator: BandwidthAllocator,
    capacity: Arc<dyn CapacityEstimate>,
}

impl AdmissionQueue {
    pub fn new(
        max_concurrent: usize,
        allocator: BandwidthAllocator,
        capacity: Arc<dyn CapacityEstimate>,
    ) -> Self {
        let limit = max_concurrent.max(1);
        Self {
            slots: Arc::new(Semaphore::new(limit)),
            limit,
            active: Mutex::new(HashMap::new()),
            realloc: Mutex::new(()),
            allocator,
            capacity,
        }
    }

    /// Configured concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Slots not currently held by an active transfer.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.active.lock().contains_key(task_id)
    }

    /// Wait for a free slot, then register the transfer as active and
    /// re-allocate. Cancelling `cancel` abandons the wait without taking a slot.
    pub async fn enqueue(
        &self,
        request: AdmissionRequest,
        cancel: &CancellationToken,
    ) -> Result<(), AdmissionError> {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AdmissionError::Cancelled),
            permit = Arc::clone(&self.slots).acquire_owned() => {
                permit.map_err(|_| AdmissionError::Closed)?
            }
        };

        let id = request.handle.id().to_string();
        let capacity = self.capacity.total_bytes_per_sec();
        let _realloc = self.realloc.lock();
        let updates = {
            let mut active = self.active.lock();
            if active.contains_key(&id) {
                return Err(AdmissionError::AlreadyActive(id));
            }
            active.insert(
                id.clone(),
                ActiveTask {
                    handle: request.handle,
                    class: request.class,
                    max_bytes_per_sec: request.max_bytes_per_sec,
                    cap: 0,
                    _permit: permit,
                },
            );
            tracing::debug!(task = %id, active = active.len(), "admitted");
            self.reallocate(&mut active, capacity)
        };
        push_caps(updates);
        Ok(())
    }

    /// Remove an active transfer, free its slot and re-allocate. Returns false
    /// if the task was not active.
    pub fn dequeue(&self, task_id: &str) -> bool {
        let capacity = self.capacity.total_bytes_per_sec();
        let _realloc = self.realloc.lock();
        let updates = {
            let mut active = self.active.lock();
            if active.remove(task_id).is_none() {
                return false;
            }
            tracing::debug!(task = %task_id, active = active.len(), "released");
            self.reallocate(&mut active, capacity)
        };
        push_caps(updates);
        true
    }

    /// Change the class of an active transfer and re-allocate immediately.
    pub fn update_priority(&self, task_id: &str, class: Option<PriorityClass>) -> bool {
        let capacity = self.capacity.total_bytes_per_sec();
        let _realloc = self.realloc.lock();
        let updates = {
            let mut active = self.active.lock();
            let Some(task) = active.get_mut(task_id) else {
                return false;
            };
            task.class = class;
            self.reallocate(&mut active, capacity)
        };
        push_caps(updates);
        true
    }

    /// Re-partition with a fresh capacity estimate (e.g. after the forecast moved).
    pub fn rebalance(&self) {
        let capacity = self.capacity.total_bytes_per_sec();
        let _realloc = self.realloc.lock();
        let updates = self.reallocate(&mut self.active.lock(), capacity);
        push_caps(updates);
    }

    /// Active transfers with their class and current cap, ordered by id.
    pub fn snapshot(&self) -> Vec<QueueStatus> {
        let active = self.active.lock();
        let mut out: Vec<QueueStatus> = active
            .iter()
            .map(|(id, t)| QueueStatus {
                task_id: id.clone(),
                class: t.class,
                cap_bytes_per_sec: t.cap,
            })
            .collect();
        out.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        out
    }

    /// Refuse further admissions; pending waits fail with `Closed`.
    pub fn close(&self) {
        self.slots.close();
    }

    // Records the new caps in the set; the caller pushes them to the handles.
    fn reallocate(
        &self,
        active: &mut HashMap<TaskId, ActiveTask>,
        capacity: f64,
    ) -> CapUpdates {
        let members: Vec<Member<'_>> = active
            .iter()
            .map(|(id, t)| Member {
                id: id.as_str(),
                class: t.class,
                max_bytes_per_sec: t.max_bytes_per_sec,
            })
            .collect();
        let caps = self.allocator.allocate(capacity, &members);
        let mut updates = Vec::with_capacity(caps.len());
        for (id, cap) in caps {
            if let Some(task) = active.get_mut(&id) {
                task.cap = cap;
                updates.push((Arc::clone(&task.handle), cap));
            }
        }
        updates
    }
}

fn push_caps(updates: CapUpdates) {
    for (handle, cap) in updates {
        handle.set_throughput_cap(cap);
    }
}

#[cfg(test)]
mod tests;
