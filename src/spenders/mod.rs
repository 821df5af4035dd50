pub mod registry;
pub mod watchlist;
