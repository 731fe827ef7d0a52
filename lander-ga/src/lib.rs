pub mod config;
pub mod genetic;
pub mod search;
pub mod store;
pub mod util;
