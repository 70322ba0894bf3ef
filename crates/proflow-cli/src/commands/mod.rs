pub mod config;
pub mod hook;
pub mod learnings;
pub mod score;
pub mod session;
