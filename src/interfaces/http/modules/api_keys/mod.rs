//! API key management routes

pub mod dto;
pub mod handlers;

pub use handlers::*;
