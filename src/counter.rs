use crate::config::Config;
use crate::customer::{CustomerId, CustomerRecord};
use crate::events::{ClerkId, CustomerEvent, EventKind, EventSink};
use crate::rendezvous::{lock, ClassRendezvous, Handshake};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

// A customer that went through the counter.
//
// Attributes:
// * `customer`: The record, with `waiting_time` already reset.
// * `clerk`: Clerk that served the customer.
// * `waited`: Time between joining the service queue and being selected.
// * `started`, `finished`: Service interval, measured from the start of the run.
#[derive(Debug, Clone, Serialize)]
pub struct Departure {
    pub customer: CustomerRecord,
    pub clerk: ClerkId,
    pub waited: Duration,
    pub started: Duration,
    pub finished: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub class: usize,
    pub len: usize,
    pub head: Option<CustomerId>,
    pub customers: Vec<CustomerId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterSnapshot {
    pub elapsed: Duration,
    pub arriving: Vec<CustomerId>,
    pub queues: Vec<QueueSnapshot>,
    pub leaving: Vec<CustomerId>,
}

// Shared state of one run. Every customer and clerk task borrows the same
// `Counter` and only touches its fields through their locks.
pub struct Counter {
    config: Config,
    classes: Vec<ClassRendezvous>,
    handshakes: Vec<Handshake>,
    arriving: Mutex<Vec<CustomerRecord>>,
    leaving: Mutex<Vec<Departure>>,
    sink: Box<dyn EventSink>,
    start: Instant,
    closed: AtomicBool,
}

impl Counter {
    pub fn new(config: Config, sink: Box<dyn EventSink>) -> Self {
        let classes = (0..config.classes).map(|_| ClassRendezvous::new()).collect();
        let handshakes = (0..config.clerks).map(|_| Handshake::new()).collect();
        Counter {
            config,
            classes,
            handshakes,
            arriving: Mutex::new(Vec::new()),
            leaving: Mutex::new(Vec::new()),
            sink,
            start: Instant::now(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn class(&self, class: usize) -> &ClassRendezvous {
        &self.classes[class]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn handshake(&self, clerk: ClerkId) -> &Handshake {
        &self.handshakes[clerk]
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn emit(&self, customer: &CustomerRecord, kind: EventKind) {
        self.sink.record(&CustomerEvent {
            customer: customer.clone(),
            kind,
            at: self.elapsed(),
        });
    }

    pub fn add_arriving(&self, customer: &CustomerRecord) {
        lock(&self.arriving).push(customer.clone());
    }

    pub fn remove_arriving(&self, id: CustomerId) {
        lock(&self.arriving).retain(|c| c.id != id);
    }

    pub fn add_leaving(&self, departure: Departure) {
        lock(&self.leaving).push(departure);
    }

    // Stops the clerks at their next poll.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn queue_snapshot(&self, class: usize) -> QueueSnapshot {
        let state = lock(&self.classes[class].state);
        QueueSnapshot {
            class,
            len: state.queue.len(),
            head: state.queue.peek_head(),
            customers: state.queue.iter().map(|c| c.id).collect(),
        }
    }

    // Copies every structure, taking one lock at a time.
    pub fn snapshot(&self) -> CounterSnapshot {
        let elapsed = self.elapsed();
        let arriving = lock(&self.arriving).iter().map(|c| c.id).collect();
        let queues = (0..self.classes.len())
            .map(|class| self.queue_snapshot(class))
            .collect();
        let leaving = lock(&self.leaving).iter().map(|d| d.customer.id).collect();
        CounterSnapshot {
            elapsed,
            arriving,
            queues,
            leaving,
        }
    }
}
