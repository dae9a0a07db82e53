use serde::Serialize;
use std::fmt;

pub type CustomerId = u32;

// Represents a customer of the counter.
//
// The identity and timing fields are fixed when the customer file is read.
// `waiting_time` is the only runtime field and it is reset to zero once the
// customer starts being served.
//
// Attributes:
// * `id`: Unique identifier of the customer.
// * `class`: Priority class, 0 is the lowest. Higher classes are served first.
// * `arrival`: Simulated units before the customer reaches the counter.
// * `service`: Simulated units the service takes.
// * `waiting_time`: Simulated units spent waiting in the service queue.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub class: usize,
    pub arrival: u64,
    pub service: u64,
    pub waiting_time: u64,
}

impl CustomerRecord {
    pub fn new(id: CustomerId, class: usize, arrival: u64, service: u64) -> Self {
        CustomerRecord {
            id,
            class,
            arrival,
            service,
            waiting_time: 0,
        }
    }
}

// Same layout as a line of the customer file.
impl fmt::Display for CustomerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{},{}",
            self.id, self.class, self.arrival, self.service
        )
    }
}
