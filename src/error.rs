use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DinnerError {
    #[error("there must be at least 2 philosophers (got {given})")]
    TooFewPhilosophers { given: usize },

    #[error("failed to seat philosopher {id}")]
    Spawn {
        id: usize,
        #[source]
        source: io::Error,
    },

    #[error("philosopher {id} panicked before finishing")]
    Panicked { id: usize },
}
