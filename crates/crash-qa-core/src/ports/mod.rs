//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the analysis core and external adapters.

mod input_source;
mod progress;
mod report_writer;

pub use input_source::InputSource;
pub use progress::{ProgressEvent, ProgressSink};
pub use report_writer::ReportWriter;
