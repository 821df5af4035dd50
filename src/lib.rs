pub mod analysis;
pub mod api;
pub mod approvals;
pub mod cache;
pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod risk;
pub mod scan;
pub mod sources;
pub mod spenders;
pub mod tokens;

#[cfg(test)]
pub(crate) mod testing;
