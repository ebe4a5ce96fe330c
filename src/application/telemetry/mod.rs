pub mod identity;
pub mod reporter;
pub mod scheduler;

pub use identity::load_or_create_identifier;
pub use reporter::{
    Collection, CollectionRetryConfig, ReportOutcome, TelemetryReporter, TickReport,
};
pub use scheduler::TelemetryScheduler;
