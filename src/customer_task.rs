use crate::counter::{Counter, Departure};
use crate::customer::CustomerRecord;
use crate::events::{ClerkId, EventKind};
use crate::rendezvous::lock;
use std::sync::PoisonError;
use std::thread;
use std::time::{Duration, Instant};

// Drives one customer through the counter: arrive, wait in its class queue,
// win a clerk broadcast, get served and leave.
//
// Runs on its own thread and returns once the customer left.
//
// Arguments:
// * `counter`: Shared state of the run.
// * `customer`: The customer, moved into the task.
pub fn run_customer(counter: &Counter, mut customer: CustomerRecord) -> Departure {
    let unit = counter.config().time_unit;
    let id = customer.id;

    counter.emit(&customer, EventKind::Arrived);
    counter.add_arriving(&customer);
    thread::sleep(unit.duration(customer.arrival));
    counter.remove_arriving(id);

    let (clerk, waited) = wait_for_clerk(counter, &customer);
    customer.waiting_time = 0;

    let handshake = counter.handshake(clerk);
    let started = counter.elapsed();
    counter.emit(&customer, EventKind::BeingServed(clerk));
    handshake.post();
    thread::sleep(unit.duration(customer.service));
    let finished = counter.elapsed();
    handshake.post();
    counter.emit(&customer, EventKind::Finished(clerk));

    let departure = Departure {
        customer: customer.clone(),
        clerk,
        waited,
        started,
        finished,
    };
    counter.add_leaving(departure.clone());
    counter.emit(&customer, EventKind::Left);
    departure
}

// Enqueues the customer in its class and blocks until it wins a broadcast.
//
// The queue lock is held the whole time except while suspended on the wake
// condition, so nothing is reported to the event sink in between. A broadcast wakes every waiter of the class: each one re-checks
// and acks, only the head wins and only if nobody claimed this cycle yet.
// The winner then waits for the remaining acks so that every sibling is
// suspended again before service starts.
//
// Returns:
// The clerk that made the winning broadcast and how long the customer sat in the queue.
fn wait_for_clerk(counter: &Counter, customer: &CustomerRecord) -> (ClerkId, Duration) {
    let class = counter.class(customer.class);
    counter.emit(customer, EventKind::Waiting);
    let mut state = lock(&class.state);
    state.queue.append(customer.clone());
    let enqueued = Instant::now();
    let mut seen = state.generation;

    let clerk = loop {
        state = class
            .wake
            .wait_while(state, |s| s.generation == seen)
            .unwrap_or_else(PoisonError::into_inner);
        seen = state.generation;

        let won = state.queue.peek_head() == Some(customer.id) && !state.win_flag;
        if won {
            state.queue.remove_head();
            state.win_flag = true;
        }
        if state.ack() {
            class.settled.notify_all();
        }
        if won {
            break state.assigned_clerk;
        }
    };
    let waited = enqueued.elapsed();

    let state = class
        .settled
        .wait_while(state, |s| s.pending_acks > 0)
        .unwrap_or_else(PoisonError::into_inner);
    drop(state);

    log::debug!(
        "[CUSTOMER {}] selected by clerk {} from class {}",
        customer.id,
        clerk,
        customer.class
    );
    (clerk, waited)
}
