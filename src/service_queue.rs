use crate::customer::{CustomerId, CustomerRecord};
use std::collections::VecDeque;

// FIFO of the customers waiting in one priority class.
//
// It does no locking of its own: it always lives inside the class mutex and
// every method assumes the caller holds it.
#[derive(Debug, Default)]
pub struct ServiceQueue {
    customers: VecDeque<CustomerRecord>,
}

impl ServiceQueue {
    pub fn append(&mut self, customer: CustomerRecord) {
        self.customers.push_back(customer);
    }

    pub fn peek_head(&self) -> Option<CustomerId> {
        self.customers.front().map(|c| c.id)
    }

    pub fn remove_head(&mut self) -> Option<CustomerRecord> {
        self.customers.pop_front()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomerRecord> {
        self.customers.iter()
    }
}
