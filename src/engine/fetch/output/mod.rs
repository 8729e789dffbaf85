mod channel;
mod consumer;
mod controller;
mod filter;

pub use channel::{OutputChannel, OutputItem, OutputQueueMetrics, OutputReceiver, OutputSender};
pub use consumer::{FileRecordWriter, MemoryRecordCollector, OutputConsumer};
pub use controller::OutputController;
pub use filter::{ChangesOnlyFilter, ChannelStreamFilter};
