//! Tests for the admission gate and bandwidth re-allocation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{TrackedTransfer, TransferReport};

use super::*;

const NINE_MB: f64 = 9_000_000.0;

fn queue(limit: usize, capacity: f64) -> Arc<AdmissionQueue> {
    Arc::new(AdmissionQueue::new(
        limit,
        BandwidthAllocator::default(),
        Arc::new(FixedCapacity(capacity)),
    ))
}

fn request(t: &Arc<TrackedTransfer>, class: Option<PriorityClass>) -> AdmissionRequest {
    AdmissionRequest {
        handle: t.clone(),
        class,
        max_bytes_per_sec: 0,
    }
}

#[tokio::test]
async fn example_split_high_medium_medium() {
    let q = queue(5, NINE_MB);
    let h = Arc::new(TrackedTransfer::new("h"));
    let m1 = Arc::new(TrackedTransfer::new("m1"));
    let m2 = Arc::new(TrackedTransfer::new("m2"));
    let token = CancellationToken::new();
    q.enqueue(request(&h, Some(PriorityClass::High)), &token).await.unwrap();
    q.enqueue(request(&m1, Some(PriorityClass::Medium)), &token).await.unwrap();
    q.enqueue(request(&m2, Some(PriorityClass::Medium)), &token).await.unwrap();

    assert_eq!(h.cap(), 4_500_000);
    assert_eq!(m1.cap(), 1_350_000);
    assert_eq!(m2.cap(), 1_350_000);

    let snap = q.snapshot();
    assert_eq!(snap.len(), 3);
    assert_eq!(snap[0].task_id, "h");
    assert_eq!(snap[0].cap_bytes_per_sec, 4_500_000);
}

#[tokio::test]
async fn release_redistributes_without_lowering_any_cap() {
    let q = queue(5, NINE_MB);
    let token = CancellationToken::new();
    let tasks: Vec<_> = [
        ("h", Some(PriorityClass::High)),
        ("m1", Some(PriorityClass::Medium)),
        ("m2", Some(PriorityClass::Medium)),
        ("l", Some(PriorityClass::Low)),
        ("u", None),
    ]
    .into_iter()
    .map(|(id, class)| (Arc::new(TrackedTransfer::new(id)), class))
    .collect();
    for (t, class) in &tasks {
        q.enqueue(request(t, *class), &token).await.unwrap();
    }
    let before: Vec<u64> = tasks.iter().map(|(t, _)| t.cap()).collect();

    assert!(q.dequeue("m1"));
    let after: Vec<u64> = tasks.iter().map(|(t, _)| t.cap()).collect();
    for (i, (b, a)) in before.iter().zip(&after).enumerate() {
        if i != 1 {
            assert!(a >= b, "cap of task {i} dropped from {b} to {a}");
        }
    }
    // m2 now owns the whole medium share.
    assert_eq!(tasks[2].0.cap(), 2_700_000);
}

#[tokio::test]
async fn enqueue_waits_for_a_free_slot() {
    let q = queue(2, NINE_MB);
    let token = CancellationToken::new();
    let a = Arc::new(TrackedTransfer::new("a"));
    let b = Arc::new(TrackedTransfer::new("b"));
    let c = Arc::new(TrackedTransfer::new("c"));
    q.enqueue(request(&a, None), &token).await.unwrap();
    q.enqueue(request(&b, None), &token).await.unwrap();
    assert_eq!(q.available_slots(), 0);

    let waiter = {
        let q = q.clone();
        let req = request(&c, None);
        let token = token.clone();
        tokio::spawn(async move { q.enqueue(req, &token).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!q.is_active("c"));
    assert_eq!(q.active_count(), 2);

    assert!(q.dequeue("a"));
    waiter.await.unwrap().unwrap();
    assert!(q.is_active("c"));
    assert_eq!(q.active_count(), 2);
    assert_eq!(q.available_slots(), 0);
}

#[tokio::test]
async fn cancelling_a_blocked_enqueue_takes_no_slot() {
    let q = queue(1, NINE_MB);
    let a = Arc::new(TrackedTransfer::new("a"));
    let b = Arc::new(TrackedTransfer::new("b"));
    q.enqueue(request(&a, None), &CancellationToken::new()).await.unwrap();

    let token = CancellationToken::new();
    let waiter = {
        let q = q.clone();
        let req = request(&b, None);
        let token = token.clone();
        tokio::spawn(async move { q.enqueue(req, &token).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();
    assert_eq!(waiter.await.unwrap(), Err(AdmissionError::Cancelled));
    assert!(!q.is_active("b"));

    q.dequeue("a");
    assert_eq!(q.available_slots(), 1);
}

#[tokio::test]
async fn duplicate_admission_is_rejected_and_slot_returned() {
    let q = queue(3, NINE_MB);
    let token = CancellationToken::new();
    let a = Arc::new(TrackedTransfer::new("a"));
    q.enqueue(request(&a, None), &token).await.unwrap();
    assert_eq!(
        q.enqueue(request(&a, None), &token).await,
        Err(AdmissionError::AlreadyActive("a".into()))
    );
    assert_eq!(q.available_slots(), 2);
    assert_eq!(q.active_count(), 1);
}

#[tokio::test]
async fn priority_update_reallocates_immediately() {
    let q = queue(3, 10_000_000.0);
    let token = CancellationToken::new();
    let a = Arc::new(TrackedTransfer::new("a"));
    q.enqueue(request(&a, Some(PriorityClass::Low)), &token).await.unwrap();
    assert_eq!(a.cap(), 2_000_000);
    assert!(q.update_priority("a", Some(PriorityClass::High)));
    assert_eq!(a.cap(), 5_000_000);
    assert!(!q.update_priority("missing", Some(PriorityClass::High)));
}

#[tokio::test]
async fn closed_queue_refuses_waiters() {
    let q = queue(1, NINE_MB);
    let token = CancellationToken::new();
    let a = Arc::new(TrackedTransfer::new("a"));
    let b = Arc::new(TrackedTransfer::new("b"));
    q.enqueue(request(&a, None), &token).await.unwrap();
    q.close();
    assert_eq!(
        q.enqueue(request(&b, None), &token).await,
        Err(AdmissionError::Closed)
    );
}

#[test]
fn dequeue_of_unknown_task_is_false() {
    let q = queue(1, NINE_MB);
    assert!(!q.dequeue("ghost"));
}

/// Handle that checks, on every cap push, whether the queue still holds its
/// active-set lock.
struct LockCheckingTransfer {
    id: String,
    queue: OnceLock<Weak<AdmissionQueue>>,
    pushes: AtomicUsize,
    pushes_under_lock: AtomicUsize,
    reports: watch::Sender<TransferReport>,
}

impl LockCheckingTransfer {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            queue: OnceLock::new(),
            pushes: AtomicUsize::new(0),
            pushes_under_lock: AtomicUsize::new(0),
            reports: watch::channel(TransferReport::default()).0,
        }
    }
}

impl TransferHandle for LockCheckingTransfer {
    fn id(&self) -> &str {
        &self.id
    }

    fn start(&self) {}

    fn pause(&self) {}

    fn resume(&self) {}

    fn cancel(&self) {}

    fn set_throughput_cap(&self, _bytes_per_sec: u64) {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        if let Some(queue) = self.queue.get().and_then(Weak::upgrade) {
            if queue.active.try_lock().is_none() {
                self.pushes_under_lock.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn subscribe(&self) -> watch::Receiver<TransferReport> {
        self.reports.subscribe()
    }
}

#[tokio::test]
async fn caps_are_pushed_after_the_active_set_is_released() {
    let q = queue(3, NINE_MB);
    let token = CancellationToken::new();
    let watched = Arc::new(LockCheckingTransfer::new("watched"));
    let _ = watched.queue.set(Arc::downgrade(&q));
    let other = Arc::new(TrackedTransfer::new("other"));

    let req = AdmissionRequest {
        handle: watched.clone(),
        class: Some(PriorityClass::Medium),
        max_bytes_per_sec: 0,
    };
    q.enqueue(req, &token).await.unwrap();
    q.enqueue(request(&other, None), &token).await.unwrap();
    q.update_priority("watched", Some(PriorityClass::High));
    q.rebalance();
    q.dequeue("other");

    assert_eq!(watched.pushes.load(Ordering::SeqCst), 5);
    assert_eq!(watched.pushes_under_lock.load(Ordering::SeqCst), 0);
    assert_eq!(q.snapshot()[0].cap_bytes_per_sec, 4_500_000);
}
