//! Classification, aggregation and presentation of run results

pub mod aggregator;
pub mod plain;
pub mod writer;

pub use aggregator::{classify, AggregateReport, Aggregator, Classification, RunStats};
pub use writer::{write_report, ReportError};
