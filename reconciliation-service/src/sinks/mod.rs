pub mod reconciliation;

pub use reconciliation::{PassSummary, ReconciliationSink};
