pub mod collector;
pub mod filter;
pub mod platform;
pub mod snapshot;
