use crate::events::ClerkId;
use crate::service_queue::ServiceQueue;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, TryLockError};
use std_semaphore::Semaphore;

// Acquires `mutex`, recovering the guard if another task panicked while holding it.
// Every critical section of the protocol leaves the state consistent, so a
// poisoned lock is still usable.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// Non-blocking acquire. `None` only when some other task holds the lock.
pub fn try_lock<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

// Everything guarded by the queue lock of one class.
//
// Attributes:
// * `queue`: Customers waiting in this class.
// * `win_flag`: Set by the customer that claims the current broadcast.
// * `assigned_clerk`: Clerk that made the current broadcast. Only the winner reads it.
// * `generation`: Incremented on every broadcast. A waiter only re-checks when it changes,
//   so spurious wake-ups are ignored.
// * `pending_acks`: Waiters of the current broadcast that have not re-checked yet.
#[derive(Debug, Default)]
pub struct ClassState {
    pub queue: ServiceQueue,
    pub win_flag: bool,
    pub assigned_clerk: ClerkId,
    pub generation: u64,
    pub pending_acks: usize,
}

impl ClassState {
    // Opens a new wake cycle on behalf of `clerk`. Every customer in the queue
    // is suspended on the wake condition at this point and owes one ack.
    pub fn open_cycle(&mut self, clerk: ClerkId) {
        self.assigned_clerk = clerk;
        self.win_flag = false;
        self.generation += 1;
        self.pending_acks = self.queue.len();
    }

    // Acknowledges the current cycle. Returns true for the last ack.
    pub fn ack(&mut self) -> bool {
        self.pending_acks = self.pending_acks.saturating_sub(1);
        self.pending_acks == 0
    }
}

// Rendezvous state of one priority class.
//
// `state` is the queue lock and `commit` is the clerk lock. They are kept
// apart: a clerk holds `commit` from its broadcast until the winner starts
// service, while customers keep using `state` in the meantime.
#[derive(Debug, Default)]
pub struct ClassRendezvous {
    pub state: Mutex<ClassState>,
    pub commit: Mutex<()>,
    // Broadcast by the committing clerk.
    pub wake: Condvar,
    // Notified by the last waiter to ack a broadcast.
    pub settled: Condvar,
}

impl ClassRendezvous {
    pub fn new() -> Self {
        ClassRendezvous::default()
    }
}

// Two-count signal between a clerk and the customer it serves. The first
// post means service started, the second that it ended.
pub struct Handshake {
    signal: Semaphore,
}

impl Handshake {
    pub fn new() -> Self {
        Handshake {
            signal: Semaphore::new(0),
        }
    }

    pub fn post(&self) {
        self.signal.release();
    }

    // Blocks until a post is available and consumes it.
    pub fn wait(&self) {
        self.signal.acquire();
    }
}
