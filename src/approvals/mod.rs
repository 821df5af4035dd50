pub mod reducer;
pub mod types;
