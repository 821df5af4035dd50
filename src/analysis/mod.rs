pub mod batch;
pub mod pipeline;
pub mod services;
pub mod types;
