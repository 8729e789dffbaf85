mod cursor;
mod stream_processor;

pub use cursor::RecordCursor;
pub use stream_processor::QueryStreamProcessor;
