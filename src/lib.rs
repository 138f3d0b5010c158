pub mod config;
pub mod dinner;
pub mod error;
pub mod fork;
pub mod ordering;
pub mod philosopher;
pub mod reporter;
pub mod semaphore;
pub mod table;

pub use config::{Protocol, TableConfig, Timing, MEALS};
pub use dinner::{Dinner, DinnerSummary};
pub use error::DinnerError;
pub use reporter::{ConsoleReporter, Event, MemoryReporter, Reporter};
