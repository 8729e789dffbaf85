mod info;
mod processor;
mod reader;
mod registry;
mod writer;

pub use info::{BatchData, IndexEntry, ProcessedBatchInfo};
pub use processor::BatchProcessor;
pub use reader::{BatchReader, IndexReader};
pub use registry::BatchRegistry;
pub use writer::{BatchWriter, IndexWriter};
