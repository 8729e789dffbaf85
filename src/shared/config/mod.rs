pub mod model;

pub use model::{LoggingConfig, Settings, load_settings};
