pub mod auth;
pub mod filter;
pub mod trace;
