//! Small helpers shared across providers and strategies.

pub mod phone;
pub mod retry;
