use crate::counter::Counter;
use crate::events::ClerkId;
use crate::rendezvous::{try_lock, ClassState};
use std::sync::MutexGuard;
use std::thread;

// A class picked by a scan: both of its locks are held and its queue is not empty.
pub struct Selection<'a> {
    class: usize,
    commit: MutexGuard<'a, ()>,
    state: MutexGuard<'a, ClassState>,
}

impl Selection<'_> {
    pub fn class(&self) -> usize {
        self.class
    }
}

// A class the clerk broadcast to. Only the commit lock is still held, until
// the winning customer signals the start of service.
pub struct Committed<'a> {
    class: usize,
    commit: MutexGuard<'a, ()>,
}

impl Committed<'_> {
    pub fn class(&self) -> usize {
        self.class
    }
}

pub struct Clerk<'a> {
    id: ClerkId,
    counter: &'a Counter,
}

impl<'a> Clerk<'a> {
    pub fn new(id: ClerkId, counter: &'a Counter) -> Self {
        Clerk { id, counter }
    }

    // Clerk loop. Exits at the next poll once the counter is closed, which is
    // the only point where the clerk holds no lock.
    pub fn run(&self) {
        log::debug!("[CLERK {}] Open", self.id);
        while !self.counter.is_closed() {
            thread::sleep(self.counter.config().clerk_poll);

            if let Some(selection) = self.scan() {
                log::trace!("[CLERK {}] Selected class {}", self.id, selection.class());
                let committed = self.commit(selection);
                self.serve(committed);
            }
        }
        log::debug!("[CLERK {}] Closed", self.id);
    }

    // Looks for work from the highest class down.
    //
    // Both locks are only tried, never waited for: a class whose commit lock
    // belongs to another clerk, or whose queue lock is busy, is skipped until
    // the next scan. Guards of a skipped class are dropped before moving on.
    pub fn scan(&self) -> Option<Selection<'a>> {
        let counter: &'a Counter = self.counter;
        for class in (0..counter.class_count()).rev() {
            let rendezvous = counter.class(class);
            let Some(commit) = try_lock(&rendezvous.commit) else {
                continue;
            };
            let Some(state) = try_lock(&rendezvous.state) else {
                continue;
            };
            if state.queue.is_empty() {
                continue;
            }
            return Some(Selection {
                class,
                commit,
                state,
            });
        }
        None
    }

    // Opens a wake cycle on the selected class and wakes all of its waiters.
    // Releases the queue lock so they can re-check, keeps the commit lock.
    pub fn commit(&self, selection: Selection<'a>) -> Committed<'a> {
        let Selection {
            class,
            commit,
            mut state,
        } = selection;

        state.open_cycle(self.id);
        log::debug!(
            "[CLERK {}] Committed to class {} ({} waiting)",
            self.id,
            class,
            state.pending_acks
        );
        self.counter.class(class).wake.notify_all();
        drop(state);

        Committed { class, commit }
    }

    // Two-phase handshake with the winner. The commit lock is released as soon
    // as service starts, the call returns when it ends.
    pub fn serve(&self, committed: Committed<'a>) {
        let handshake = self.counter.handshake(self.id);

        handshake.wait();
        log::debug!(
            "[CLERK {}] Serving a class {} customer",
            self.id,
            committed.class()
        );
        drop(committed.commit);

        handshake.wait();
        log::debug!("[CLERK {}] Service finished", self.id);
    }
}
