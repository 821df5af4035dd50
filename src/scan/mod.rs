pub mod orchestrator;
pub mod rate_limit;
pub mod recommendations;
