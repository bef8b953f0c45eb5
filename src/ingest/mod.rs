//! Post ingestion: JSON lines in, social graph out

pub mod interactions;
pub mod pipeline;
pub mod record;

pub use interactions::InteractionIndex;
pub use pipeline::{CancellationFlag, IngestError, IngestPipeline, IngestReport};
pub use record::{parse_line, RecordError};
