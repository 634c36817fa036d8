//! Key-protected repository summarizer

pub mod dto;
pub mod handlers;

pub use handlers::*;
