use crate::customer::CustomerId;
use std::io;
use thiserror::Error;

// Errors that stop a run before or while the tasks are started.
//
// There are no runtime protocol errors: once every task is running the only
// way out is a panic in one of them, reported as `Join`.
#[derive(Debug, Error)]
pub enum AcsError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("customer {id} has class {class}, expected a class below {classes}")]
    InvalidClass {
        id: CustomerId,
        class: usize,
        classes: usize,
    },

    #[error("customer id {0} appears more than once")]
    DuplicateId(CustomerId),

    #[error("customer {0} has a service time of zero")]
    InvalidServiceTime(CustomerId),

    #[error("invalid range for {name}: {min} > {max}")]
    InvalidRange { name: &'static str, min: u64, max: u64 },

    #[error("at least one clerk is required")]
    NoClerks,

    #[error("at least one customer class is required")]
    NoClasses,

    #[error("failed to spawn {what}: {source}")]
    Spawn {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error("a {0} task panicked")]
    Join(&'static str),
}
