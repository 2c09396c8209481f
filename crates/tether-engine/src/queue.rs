//! Deferred mutation queue: many producers, one host-thread executor.
//!
//! [`MutationQueue`] handles are cheap to clone and may be used from any
//! thread. [`schedule`](MutationQueue::schedule) stages the mutation,
//! assigns the next [`ActionSeq`], and pushes an entry onto an unbounded
//! crossbeam channel, all inside one short critical section, so channel
//! order is sequence order. It never waits on the executor.
//!
//! [`MutationExecutor`] is the single consumer. It is bound to the host
//! thread and [`drain_and_execute`](MutationExecutor::drain_and_execute)
//! runs every entry that was queued when the drain started, in
//! submission order. Each entry runs under `catch_unwind`; a failing or
//! panicking entry is logged and recorded in its receipt, and the drain
//! moves on.
//!
//! # Staging
//!
//! Under [`StagingMode::SingleSlot`] typed mutations go through one slot
//! per kind. Two same-kind submissions before a drain leave the second
//! payload in the slot; the first entry applies it and the second finds
//! the slot empty and is skipped. [`StagingMode::Inline`] carries the
//! payload in the entry instead.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

use tether_binding::BindingResolver;
use tether_core::{
    ActionOutcome, ActionReceipt, ActionSeq, HostError, HostRef, MutationKind, PendingMutation,
    QueueError, Vector3,
};

use crate::actions;
use crate::config::{BridgeConfig, SettleDelays, StagingMode};
use crate::metrics::{QueueCounters, QueueMetrics};
use crate::staging::{SlotState, Staged, StagingSlots};

/// Body of a custom host-thread action.
pub type ActionBody = Box<dyn FnOnce(&BindingResolver) -> Result<(), HostError> + Send>;

const SKIP_CONSUMED: &str = "slot already consumed";

enum EntryBody {
    /// Typed mutation whose target and payload sit in the kind's slot.
    Slot(MutationKind),
    /// Typed mutation carrying its own target and payload.
    Inline(PendingMutation),
    /// Arbitrary host-thread closure.
    Custom { name: String, body: ActionBody },
}

struct QueueEntry {
    seq: ActionSeq,
    body: EntryBody,
}

impl QueueEntry {
    fn action_name(&self) -> &str {
        match &self.body {
            EntryBody::Slot(kind) => kind.name(),
            EntryBody::Inline(m) => m.kind.name(),
            EntryBody::Custom { name, .. } => name,
        }
    }

    fn kind(&self) -> Option<MutationKind> {
        match &self.body {
            EntryBody::Slot(kind) => Some(*kind),
            EntryBody::Inline(m) => Some(m.kind),
            EntryBody::Custom { .. } => None,
        }
    }
}

struct Staging {
    slots: StagingSlots,
    next_seq: u64,
}

struct Shared {
    staging: Mutex<Staging>,
    counters: QueueCounters,
    mode: StagingMode,
}

impl Shared {
    fn staging(&self) -> MutexGuard<'_, Staging> {
        // Action panics are caught outside this lock, so poisoning only
        // follows a panic inside the short staging section itself.
        self.staging.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Create a connected producer/executor pair.
pub fn mutation_queue(
    resolver: Arc<BindingResolver>,
    config: &BridgeConfig,
) -> (MutationQueue, MutationExecutor) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let shared = Arc::new(Shared {
        staging: Mutex::new(Staging {
            slots: StagingSlots::new(),
            next_seq: 0,
        }),
        counters: QueueCounters::default(),
        mode: config.staging,
    });
    let queue = MutationQueue {
        shared: Arc::clone(&shared),
        tx,
    };
    let executor = MutationExecutor {
        shared,
        rx,
        resolver,
        settle: config.settle,
        drain_budget: config.drain_budget,
        host_thread: None,
    };
    (queue, executor)
}

// ── MutationQueue ─────────────────────────────────────────────────

/// Producer handle. Clone freely; usable from any thread.
#[derive(Clone)]
pub struct MutationQueue {
    shared: Arc<Shared>,
    tx: Sender<QueueEntry>,
}

impl MutationQueue {
    /// Queue a typed mutation for the host thread.
    ///
    /// Returns the entry's sequence number once it is enqueued. Fails only
    /// with [`QueueError::Disconnected`] after the executor was dropped.
    pub fn schedule(
        &self,
        kind: MutationKind,
        target: HostRef,
        payload: Option<Vector3>,
    ) -> Result<ActionSeq, QueueError> {
        let mut staging = self.shared.staging();
        let seq = ActionSeq(staging.next_seq);
        let body = match self.shared.mode {
            StagingMode::SingleSlot => EntryBody::Slot(kind),
            StagingMode::Inline => {
                EntryBody::Inline(PendingMutation::new(kind, target.clone(), payload))
            }
        };
        self.tx
            .send(QueueEntry { seq, body })
            .map_err(|_| QueueError::Disconnected)?;
        staging.next_seq += 1;

        let overwritten = self.shared.mode == StagingMode::SingleSlot
            && staging.slots.stage(kind, Staged { target, payload });
        drop(staging);

        self.shared.counters.record_scheduled();
        if overwritten {
            self.shared.counters.record_overwrite();
            debug!(%seq, action = kind.name(), "pending staging overwritten");
        }
        debug!(%seq, action = kind.name(), "mutation scheduled");
        Ok(seq)
    }

    /// Queue a [`PendingMutation`].
    pub fn schedule_mutation(&self, mutation: PendingMutation) -> Result<ActionSeq, QueueError> {
        self.schedule(mutation.kind, mutation.target, mutation.payload)
    }

    /// Queue an arbitrary closure for the host thread, in the same FIFO
    /// sequence as typed mutations.
    pub fn schedule_action<F>(&self, name: impl Into<String>, body: F) -> Result<ActionSeq, QueueError>
    where
        F: FnOnce(&BindingResolver) -> Result<(), HostError> + Send + 'static,
    {
        let name = name.into();
        let mut staging = self.shared.staging();
        let seq = ActionSeq(staging.next_seq);
        let entry = QueueEntry {
            seq,
            body: EntryBody::Custom {
                name: name.clone(),
                body: Box::new(body),
            },
        };
        self.tx.send(entry).map_err(|_| QueueError::Disconnected)?;
        staging.next_seq += 1;
        drop(staging);

        self.shared.counters.record_scheduled();
        debug!(%seq, action = %name, "action scheduled");
        Ok(seq)
    }

    /// State of the staging slot for `kind`.
    pub fn slot_state(&self, kind: MutationKind) -> SlotState {
        self.shared.staging().slots.state(kind)
    }

    /// Staging strategy of this queue.
    pub fn staging_mode(&self) -> StagingMode {
        self.shared.mode
    }

    /// Entries waiting for the executor.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> QueueMetrics {
        self.shared.counters.snapshot()
    }
}

impl fmt::Debug for MutationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationQueue")
            .field("mode", &self.shared.mode)
            .field("pending", &self.tx.len())
            .finish()
    }
}

// ── DrainReport ───────────────────────────────────────────────────

/// Result of one [`drain_and_execute`](MutationExecutor::drain_and_execute) pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrainReport {
    /// One receipt per executed entry, in execution (= submission) order.
    pub receipts: Vec<ActionReceipt>,
    /// Entries still queued when the pass ended (budget limit or new arrivals).
    pub remaining: usize,
}

impl DrainReport {
    /// Whether nothing ran.
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Entries that ran to completion.
    pub fn applied(&self) -> usize {
        self.count(ActionOutcome::is_applied)
    }

    /// Entries that failed or panicked.
    pub fn failed(&self) -> usize {
        self.count(ActionOutcome::is_failure)
    }

    /// Entries skipped.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ActionOutcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&ActionOutcome) -> bool) -> usize {
        self.receipts.iter().filter(|r| pred(&r.outcome)).count()
    }
}

// ── MutationExecutor ──────────────────────────────────────────────

/// The single consumer. Owned by whatever drives the host thread.
pub struct MutationExecutor {
    shared: Arc<Shared>,
    rx: Receiver<QueueEntry>,
    resolver: Arc<BindingResolver>,
    settle: SettleDelays,
    drain_budget: Option<usize>,
    host_thread: Option<(ThreadId, String)>,
}

// Compile-time assertion: the executor moves onto the host thread.
const _: fn() = || {
    fn assert<T: Send>() {}
    assert::<MutationExecutor>();
    fn assert_shared<T: Send + Sync>() {}
    assert_shared::<MutationQueue>();
};

fn thread_label() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl MutationExecutor {
    /// Bind the executor to the calling thread.
    ///
    /// Replaces any earlier binding. Without an explicit call the first
    /// drain binds.
    pub fn bind_current_thread(&mut self) {
        let label = thread_label();
        debug!(thread = %label, "mutation executor bound to host thread");
        self.host_thread = Some((thread::current().id(), label));
    }

    /// Whether the calling thread is the bound host thread.
    pub fn is_host_thread(&self) -> bool {
        matches!(&self.host_thread, Some((id, _)) if *id == thread::current().id())
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> QueueMetrics {
        self.shared.counters.snapshot()
    }

    /// Entries waiting.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Execute every entry queued when the drain started, in submission
    /// order, on the calling (host) thread.
    ///
    /// Entries scheduled while the drain runs wait for the next pass.
    /// With a drain budget, at most that many entries run.
    pub fn drain_and_execute(&mut self) -> Result<DrainReport, QueueError> {
        match &self.host_thread {
            None => self.bind_current_thread(),
            Some((id, bound)) if *id != thread::current().id() => {
                return Err(QueueError::WrongThread {
                    bound: bound.clone(),
                    caller: thread_label(),
                });
            }
            Some(_) => {}
        }

        let mut quota = self.rx.len();
        if let Some(budget) = self.drain_budget {
            quota = quota.min(budget);
        }

        let mut receipts = Vec::with_capacity(quota);
        for _ in 0..quota {
            match self.rx.try_recv() {
                Ok(entry) => receipts.push(self.execute(entry)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }

        if receipts.is_empty() && self.rx.is_empty() && self.producers_gone() {
            return Err(QueueError::Disconnected);
        }

        Ok(DrainReport {
            receipts,
            remaining: self.rx.len(),
        })
    }

    fn producers_gone(&self) -> bool {
        // Every producer handle holds one Arc<Shared>.
        Arc::strong_count(&self.shared) == 1
    }

    fn execute(&self, entry: QueueEntry) -> ActionReceipt {
        let seq = entry.seq;
        let action = entry.action_name().to_string();
        let kind = entry.kind();

        let staged_kind = match &entry.body {
            EntryBody::Slot(kind) => Some(*kind),
            _ => None,
        };

        let outcome = match entry.body {
            EntryBody::Slot(kind) => {
                let staged = self.shared.staging().slots.take(kind);
                match staged {
                    Some(staged) => self.run_guarded(|resolver, settle| {
                        actions::apply(resolver, settle, kind, &staged.target, staged.payload)
                    }),
                    None => ActionOutcome::Skipped {
                        reason: SKIP_CONSUMED,
                    },
                }
            }
            EntryBody::Inline(m) => self.run_guarded(|resolver, settle| {
                actions::apply(resolver, settle, m.kind, &m.target, m.payload)
            }),
            EntryBody::Custom { body, .. } => self.run_guarded(move |resolver, _| {
                body(resolver).map(|()| ActionOutcome::Applied)
            }),
        };

        if let Some(kind) = staged_kind {
            self.shared.staging().slots.finish(kind);
        }

        match &outcome {
            ActionOutcome::Applied => self.shared.counters.record_applied(),
            ActionOutcome::Skipped { reason } => {
                self.shared.counters.record_skipped();
                debug!(%seq, action = %action, reason, "action skipped");
            }
            ActionOutcome::Failed(error) => {
                self.shared.counters.record_failed();
                warn!(%seq, action = %action, %error, "action failed");
            }
            ActionOutcome::Panicked { message } => {
                self.shared.counters.record_failed();
                warn!(%seq, action = %action, panic = %message, "action panicked");
            }
        }

        ActionReceipt {
            seq,
            action,
            kind,
            outcome,
        }
    }

    fn run_guarded(
        &self,
        body: impl FnOnce(&BindingResolver, SettleDelays) -> Result<ActionOutcome, HostError>,
    ) -> ActionOutcome {
        let resolver = &*self.resolver;
        let settle = self.settle;
        match catch_unwind(AssertUnwindSafe(|| body(resolver, settle))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(error)) => ActionOutcome::Failed(error),
            Err(payload) => ActionOutcome::Panicked {
                message: panic_message(payload.as_ref()),
            },
        }
    }
}

impl fmt::Debug for MutationExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationExecutor")
            .field("pending", &self.rx.len())
            .field("host_thread", &self.host_thread.as_ref().map(|(_, n)| n))
            .finish()
    }
}
