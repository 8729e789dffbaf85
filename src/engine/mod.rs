pub mod errors;
pub mod fetch;
