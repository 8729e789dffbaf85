pub mod batch_container_factory;
pub mod channel_record_factory;
pub mod fetch_config_factory;
pub mod processed_batch_factory;
pub mod record_cursor_factory;

pub use batch_container_factory::BatchContainerFactory;
pub use channel_record_factory::ChannelRecordFactory;
pub use fetch_config_factory::FetchConfigFactory;
pub use processed_batch_factory::ProcessedBatchFactory;
pub use record_cursor_factory::{FailingCursor, RecordCursorFactory, VecCursor};

#[cfg(test)]
mod batch_container_factory_test;
#[cfg(test)]
mod channel_record_factory_test;
#[cfg(test)]
mod fetch_config_factory_test;
#[cfg(test)]
mod processed_batch_factory_test;
#[cfg(test)]
mod record_cursor_factory_test;
